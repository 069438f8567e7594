//! End-to-end properties of the public fitting API on synthetic panels.

use approx::assert_abs_diff_eq;
use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use rowfit::{
    FitConfig, Fitter, NA, RowOutput, RowWeights, SolveStrategy, fit, fit_predicted,
    fit_predicted_rowwise, fit_residuals, fit_residuals_batch_unchecked, fit_residuals_rowwise,
    fit_residuals_rowwise_weighted, fit_residuals_weighted, is_missing, valid_column_indices,
};

const TOL: f64 = 1e-9;

/// Intercept, linear and quadratic time trend over `p` positions.
fn trend_design(p: usize) -> DMatrix<f64> {
    DMatrix::from_fn(p, 3, |r, c| {
        let t = r as f64 / (p as f64 - 1.0);
        t.powi(c as i32)
    })
}

/// `n` noisy quadratic trends sampled at `p` positions.
fn synthetic_panel(n: usize, p: usize, seed: u64) -> DMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.3).unwrap();
    let x = trend_design(p);

    let mut y = DMatrix::zeros(n, p);
    for i in 0..n {
        let beta = [
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-2.0..2.0),
            rng.gen_range(-1.0..1.0),
        ];
        for j in 0..p {
            let mean: f64 = (0..3).map(|c| beta[c] * x[(j, c)]).sum();
            y[(i, j)] = mean + rng.sample(noise);
        }
    }
    y
}

fn positive_weights(n: usize, p: usize, seed: u64) -> DMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    DMatrix::from_fn(n, p, |_, _| rng.gen_range(0.2..3.0))
}

/// Knock out cells at random; roughly `rate` of them become missing.
fn with_missing(y: &DMatrix<f64>, rate: f64, seed: u64) -> DMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    y.map(|v| if rng.gen_bool(rate) { NA } else { v })
}

/// Elementwise equality that treats NaN as equal to NaN.
fn assert_same_cells(a: &DMatrix<f64>, b: &DMatrix<f64>, tol: f64) {
    assert_eq!(a.shape(), b.shape());
    for (x, y) in a.iter().zip(b.iter()) {
        if x.is_nan() || y.is_nan() {
            assert!(x.is_nan() && y.is_nan(), "{x} vs {y}");
        } else {
            assert_abs_diff_eq!(*x, *y, epsilon = tol);
        }
    }
}

#[test]
fn residuals_plus_fitted_reconstruct_complete_data() {
    let y = synthetic_panel(25, 9, 1);
    let x = trend_design(9);

    let resid = fit_residuals(&y, &x).unwrap();
    let fitted = fit_predicted(&y, &x).unwrap();
    assert_same_cells(&(resid + fitted), &y, TOL);
}

#[test]
fn unit_weights_reduce_to_ols() {
    let y = synthetic_panel(10, 7, 2);
    let x = trend_design(7);

    let ols = fit_residuals(&y, &x).unwrap();
    let wls = fit_residuals_weighted(&y, &x, &DVector::from_element(7, 1.0)).unwrap();
    assert_same_cells(&ols, &wls, TOL);
}

#[test]
fn rowwise_matches_block_fit_on_complete_data() {
    let y = synthetic_panel(30, 8, 3);
    let x = trend_design(8);

    let block = fit_residuals(&y, &x).unwrap();
    let rowwise = fit_residuals_rowwise(&y, &x).unwrap();
    assert_same_cells(&block, &rowwise, TOL);

    let block = fit_predicted(&y, &x).unwrap();
    let rowwise = fit_predicted_rowwise(&y, &x).unwrap();
    assert_same_cells(&block, &rowwise, TOL);
}

#[test]
fn rowwise_rows_match_individual_subset_fits() {
    let x = trend_design(10);
    let y = with_missing(&synthetic_panel(40, 10, 4), 0.35, 5);
    let out = fit_residuals_rowwise(&y, &x).unwrap();

    for i in 0..y.nrows() {
        let ids = valid_column_indices(y.row(i).iter());
        let row_out = out.row(i);

        if ids.len() <= x.ncols() {
            assert!(row_out.iter().all(|v| v.is_nan()), "row {i} should be skipped");
            continue;
        }

        let y_sub = DMatrix::from_iterator(1, ids.len(), ids.iter().map(|&j| y[(i, j)]));
        let expected = fit_residuals(&y_sub, &x.select_rows(ids.iter())).unwrap();
        for (pos, &j) in ids.iter().enumerate() {
            assert_abs_diff_eq!(row_out[j], expected[(0, pos)], epsilon = TOL);
        }
        for (j, missing) in is_missing(y.row(i).iter()).into_iter().enumerate() {
            assert_eq!(row_out[j].is_nan(), missing, "row {i}, col {j}");
        }
    }
}

#[test]
fn skipped_rows_are_all_nan_regardless_of_values() {
    let x = trend_design(5);
    let y = DMatrix::from_row_slice(
        3,
        5,
        &[
            1e9, NA, -1e9, NA, 42.0, // 3 valid == 3 regressors
            NA, NA, NA, NA, NA, // nothing valid
            1.0, 2.0, 3.0, 4.0, 5.0, // complete
        ],
    );

    let out = Fitter::default()
        .rows(&y, &x, RowWeights::Unweighted, RowOutput::Residuals)
        .unwrap();
    assert_eq!(out.skipped_rows, vec![0, 1]);
    assert!(out.values.row(0).iter().all(|v| v.is_nan()));
    assert!(out.values.row(1).iter().all(|v| v.is_nan()));
    assert!(out.values.row(2).iter().all(|v| v.is_finite()));
}

#[test]
fn intercept_only_scenarios() {
    let x3 = DMatrix::from_element(3, 1, 1.0);
    let y = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, NA]);
    let resid = fit_residuals_rowwise(&y, &x3).unwrap();

    assert_abs_diff_eq!(resid.row(0).sum(), 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(resid[(1, 0)] + resid[(1, 1)], 0.0, epsilon = 1e-12);
    assert!(resid[(1, 2)].is_nan());

    let x2 = DMatrix::from_element(2, 1, 1.0);
    let single = DMatrix::from_row_slice(1, 2, &[5.0, NA]);
    let out = fit_residuals_rowwise(&single, &x2).unwrap();
    assert!(out[(0, 0)].is_nan() && out[(0, 1)].is_nan());
}

#[test]
fn parallel_and_serial_runs_agree() {
    let x = trend_design(12);
    let y = with_missing(&synthetic_panel(200, 12, 6), 0.4, 7);
    let w = positive_weights(200, 12, 8);

    for strategy in SolveStrategy::ALL {
        let config = FitConfig::default().with_strategy(strategy);
        let par = Fitter::new(config.clone().with_parallel(true)).unwrap();
        let ser = Fitter::new(config.with_parallel(false)).unwrap();

        assert_same_cells(
            &par.residuals_rowwise(&y, &x).unwrap(),
            &ser.residuals_rowwise(&y, &x).unwrap(),
            0.0,
        );
        assert_same_cells(
            &par.residuals_rowwise_weighted(&y, &x, &w).unwrap(),
            &ser.residuals_rowwise_weighted(&y, &x, &w).unwrap(),
            0.0,
        );
    }
}

#[test]
fn svd_and_inverse_agree_on_well_conditioned_designs() {
    let x = trend_design(10);
    let y = with_missing(&synthetic_panel(50, 10, 9), 0.2, 10);

    let inv = Fitter::new(FitConfig::default().with_strategy(SolveStrategy::Inverse)).unwrap();
    let svd = Fitter::new(FitConfig::default().with_strategy(SolveStrategy::Svd)).unwrap();
    assert_same_cells(
        &inv.predicted_rowwise(&y, &x).unwrap(),
        &svd.predicted_rowwise(&y, &x).unwrap(),
        1e-8,
    );
}

#[test]
fn batch_driver_matches_weighted_rowwise_on_complete_data() {
    let x = trend_design(9);
    let y = synthetic_panel(20, 9, 11);
    let w = positive_weights(20, 9, 12);

    let batch = fit_residuals_batch_unchecked(&y, &x, &w).unwrap();
    let rowwise = fit_residuals_rowwise_weighted(&y, &x, &w).unwrap();
    assert_same_cells(&batch, &rowwise, TOL);
}

#[test]
fn summary_df_and_coefficients_recover_noise_free_trends() {
    let x = trend_design(6);
    let beta = DMatrix::from_row_slice(2, 3, &[1.0, -2.0, 0.5, 3.0, 0.0, -1.0]);
    let y = &beta * x.transpose();

    let summary = fit(&y, &x).unwrap();
    assert_eq!(summary.df_residual, 3);
    assert_same_cells(&summary.coefficients, &beta, 1e-8);
    assert!(summary.residual_variance.iter().all(|v| v.abs() < 1e-16));
}

#[test]
fn strategies_agree_when_weights_contain_nan() {
    let x = trend_design(8);
    let y = with_missing(&synthetic_panel(40, 8, 13), 0.2, 14);
    let mut w = positive_weights(40, 8, 15);
    for i in (0..40).step_by(7) {
        w[(i, i % 8)] = NA;
    }

    let inv = Fitter::new(FitConfig::default().with_strategy(SolveStrategy::Inverse)).unwrap();
    let svd = Fitter::new(FitConfig::default().with_strategy(SolveStrategy::Svd)).unwrap();
    assert_same_cells(
        &inv.residuals_rowwise_weighted(&y, &x, &w).unwrap(),
        &svd.residuals_rowwise_weighted(&y, &x, &w).unwrap(),
        1e-8,
    );
    assert_same_cells(
        &inv.residuals_batch_unchecked(&synthetic_panel(40, 8, 13), &x, &w).unwrap(),
        &svd.residuals_batch_unchecked(&synthetic_panel(40, 8, 13), &x, &w).unwrap(),
        1e-8,
    );
}
