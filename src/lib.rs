mod config;
mod error;
mod model;
mod report;
mod solver;

pub use config::Settings;
pub use error::{OptimizeError, Result};
pub use model::{
    Constraint, DecisionVariable, Model, ModelBuilder, Objective, PRODUCT_A, PRODUCT_B, Relation,
    Sense, production_plan,
};
pub use report::{Insights, ParsedReport, Report, ReportRow, parse_artifact};
pub use solver::{GoodLpSolver, Solution, SolveStatus, Solver, SolverOutput, TOLERANCE, solve};

use tracing::{debug, info};

/// Solve the production plan and write its report to `settings.output_path`
pub fn run<S: Solver + ?Sized>(settings: &Settings, solver: &S) -> Result<Report> {
    run_model(&production_plan(), settings, solver)
}

/// Build → solve → report. Nothing is written unless the solver finds an optimum.
pub fn run_model<S: Solver + ?Sized>(
    model: &Model,
    settings: &Settings,
    solver: &S,
) -> Result<Report> {
    debug!(
        model = %model.name,
        variables = model.variables().len(),
        constraints = model.constraints().len(),
        "model built"
    );

    let solution = solve(model, solver, settings.tolerance)?;
    let binding = model.binding_constraints(&solution.values, settings.tolerance);
    info!(
        objective = solution.objective_value,
        binding = ?binding,
        "optimal plan found"
    );

    let report = Report::from_solution(&solution)?;
    report.write_to(&settings.output_path)?;
    Ok(report)
}
