use refep_rs::testsystems::LinearLadder;
use refep_rs::*;
use std::io;

fn main() -> anyhow::Result<()> {
    let testcase = LinearLadder::default();
    let series = compute_series(&testcase.ladder())?;

    let report = ConvergenceReport::builder()
        .series(series)
        .exchange_interval(0.2)
        .include_difference(true)
        .build()?;
    report.write_csv(io::stdout())?;

    let summary = report.summary()?;
    eprintln!(
        "Converged to {:.4} (exact {:.4}), display range {:.4} to {:.4}",
        summary.converged_estimate,
        testcase.exact_free_energy(),
        summary.display_range.low,
        summary.display_range.high
    );

    Ok(())
}
