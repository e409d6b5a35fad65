//! Spectral vertex placement.
//!
//! Positions come from the eigenvectors of the graph Laplacian paired
//! with the two smallest non-trivial eigenvalues, the same placement
//! rule as classic spectral drawing. The eigenproblem is solved with
//! cyclic Jacobi rotations: the matrices here are tiny (one vertex per
//! distinct entity in a single evidence chain) and Jacobi is exactly
//! reproducible, which the re-render contract requires.

use ndarray::Array2;

const JACOBI_SWEEPS: usize = 100;
const OFF_DIAGONAL_TOLERANCE: f64 = 1e-10;

/// Position `n` vertices connected by `edges` (index pairs, direction
/// ignored) inside the unit box. Deterministic for identical input.
pub fn spectral_positions(n: usize, edges: &[(usize, usize)]) -> Vec<(f64, f64)> {
    match n {
        0 => return Vec::new(),
        1 => return vec![(0.0, 0.0)],
        2 => return vec![(-1.0, 0.0), (1.0, 0.0)],
        _ => {}
    }

    // Symmetrized Laplacian: L = D - (A + A^T), unit weights.
    let mut laplacian = Array2::<f64>::zeros((n, n));
    for &(a, b) in edges {
        if a == b || a >= n || b >= n {
            continue;
        }
        if laplacian[[a, b]] == 0.0 {
            laplacian[[a, b]] = -1.0;
            laplacian[[b, a]] = -1.0;
            laplacian[[a, a]] += 1.0;
            laplacian[[b, b]] += 1.0;
        }
    }

    let (eigenvalues, eigenvectors) = jacobi_eigen(laplacian);

    // Ascending eigenvalues, index-stable so equal values keep order.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eigenvalues[i].total_cmp(&eigenvalues[j]).then(i.cmp(&j)));

    // Skip the constant eigenvector at eigenvalue ~0; the next two span
    // the drawing plane.
    let x_column = order[1];
    let y_column = order[2];

    let mut positions: Vec<(f64, f64)> = (0..n)
        .map(|row| (eigenvectors[[row, x_column]], eigenvectors[[row, y_column]]))
        .collect();

    rescale(&mut positions);
    positions
}

/// Center on the origin and scale the largest coordinate to 1.
fn rescale(positions: &mut [(f64, f64)]) {
    let n = positions.len() as f64;
    let (mut cx, mut cy) = (0.0, 0.0);
    for (x, y) in positions.iter() {
        cx += x;
        cy += y;
    }
    cx /= n;
    cy /= n;

    let mut scale = 0.0f64;
    for (x, y) in positions.iter_mut() {
        *x -= cx;
        *y -= cy;
        scale = scale.max(x.abs()).max(y.abs());
    }
    if scale > 0.0 {
        for (x, y) in positions.iter_mut() {
            *x /= scale;
            *y /= scale;
        }
    }
}

/// Eigen-decomposition of a real symmetric matrix by cyclic Jacobi
/// rotations. Returns eigenvalues and the matching eigenvector columns.
fn jacobi_eigen(mut a: Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::<f64>::eye(n);

    for _ in 0..JACOBI_SWEEPS {
        let mut off_diagonal = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off_diagonal += a[[p, q]] * a[[p, q]];
            }
        }
        if off_diagonal.sqrt() < OFF_DIAGONAL_TOLERANCE {
            break;
        }

        for p in 0..(n - 1) {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq.abs() < OFF_DIAGONAL_TOLERANCE {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = if theta >= 0.0 {
                    1.0 / (theta + (1.0 + theta * theta).sqrt())
                } else {
                    1.0 / (theta - (1.0 + theta * theta).sqrt())
                };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[[i, i]]).collect();
    (eigenvalues, v)
}
