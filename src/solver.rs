use good_lp::solvers::microlp::microlp;
use good_lp::variable::UnsolvedProblem;
use good_lp::{
    Constraint as LpConstraint, Expression, ProblemVariables, ResolutionError,
    Solution as LpSolution, SolverModel, Variable, variable, variables,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::error::{OptimizeError, Result};
use crate::model::{Constraint, Model, Relation, Sense};

/// Absolute tolerance used when checking solver output against the model
pub const TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    NotSolved,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolveStatus::Optimal => "Optimal",
            SolveStatus::Infeasible => "Infeasible",
            SolveStatus::Unbounded => "Unbounded",
            SolveStatus::NotSolved => "Not Solved",
        };
        f.write_str(name)
    }
}

/// What comes back across the solver boundary, before any checking
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    pub status: SolveStatus,
    pub values: BTreeMap<String, f64>,
    pub objective_value: f64,
}

impl SolverOutput {
    pub fn without_solution(status: SolveStatus) -> Self {
        Self {
            status,
            values: BTreeMap::new(),
            objective_value: 0.0,
        }
    }
}

/// An LP backend that turns a [`Model`] into a status and an assignment.
pub trait Solver {
    fn solve(&self, model: &Model) -> Result<SolverOutput>;
}

/// Checked optimal assignment for a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub status: SolveStatus,
    pub values: BTreeMap<String, f64>,
    #[serde(rename = "objectiveValue")]
    pub objective_value: f64,
}

impl Solution {
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

/// Run `solver` on `model` and accept the result only if it is optimal and feasible
pub fn solve<S: Solver + ?Sized>(model: &Model, solver: &S, tolerance: f64) -> Result<Solution> {
    let output = solver.solve(model)?;
    debug!(model = %model.name, status = %output.status, "solver finished");

    if output.status != SolveStatus::Optimal {
        return Err(OptimizeError::InfeasibleOrUnbounded {
            status: output.status,
        });
    }

    // -0.0 + 0.0 == +0.0, so a zero never renders as "-0.0"
    let values: BTreeMap<String, f64> = output
        .values
        .into_iter()
        .map(|(name, value)| (name, value + 0.0))
        .collect();

    if let Some(var) = model.variables().iter().find(|v| !values.contains_key(&v.name)) {
        return Err(OptimizeError::UnknownVariable {
            name: var.name.clone(),
        });
    }
    if let Some(violated) = model.first_violation(&values, tolerance) {
        return Err(OptimizeError::InfeasibleSolution {
            constraint: violated.to_owned(),
        });
    }

    Ok(Solution {
        status: output.status,
        values,
        objective_value: output.objective_value + 0.0,
    })
}

/// [`Solver`] backed by good_lp with the pure-Rust microlp simplex
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpSolver;

impl Solver for GoodLpSolver {
    fn solve(&self, model: &Model) -> Result<SolverOutput> {
        let (problem_vars, variable_map) = init_variables(model);

        let objective = create_expression(&model.objective().coefficients, &variable_map)?;
        let constraints = model
            .constraints()
            .iter()
            .map(|c| create_constraint(c, &variable_map))
            .collect::<Result<Vec<_>>>()?;

        let problem = match model.objective().sense {
            Sense::Maximise => problem_vars.maximise(objective),
            Sense::Minimise => problem_vars.minimise(objective),
        };
        let lp = constrain_all(create_model(problem), constraints);

        match lp.solve() {
            Ok(solution) => {
                let values = read_values(&solution, &variable_map);
                let objective_value = model.objective_value(&values);
                Ok(SolverOutput {
                    status: SolveStatus::Optimal,
                    values,
                    objective_value,
                })
            }
            Err(ResolutionError::Infeasible) => {
                Ok(SolverOutput::without_solution(SolveStatus::Infeasible))
            }
            Err(ResolutionError::Unbounded) => {
                Ok(SolverOutput::without_solution(SolveStatus::Unbounded))
            }
            Err(other) => {
                warn!(error = %other, "solver stopped without a solution");
                Ok(SolverOutput::without_solution(SolveStatus::NotSolved))
            }
        }
    }
}

type NameToVariableMap = BTreeMap<String, Variable>;

fn init_variables(model: &Model) -> (ProblemVariables, NameToVariableMap) {
    let mut problem_vars = variables!();
    let mut variable_map = BTreeMap::new();

    for var in model.variables() {
        let handle = problem_vars.add(variable().min(var.lower_bound).name(var.name.clone()));
        variable_map.insert(var.name.clone(), handle);
    }

    (problem_vars, variable_map)
}

fn create_expression(
    coefficients: &BTreeMap<String, f64>,
    variable_map: &NameToVariableMap,
) -> Result<Expression> {
    coefficients
        .iter()
        .try_fold(Expression::from(0.0), |sum, (name, &coefficient)| {
            let var = variable_map
                .get(name)
                .ok_or_else(|| OptimizeError::UnknownVariable { name: name.clone() })?;
            Ok(sum + *var * coefficient)
        })
}

fn create_constraint(
    constraint: &Constraint,
    variable_map: &NameToVariableMap,
) -> Result<LpConstraint> {
    let lhs = create_expression(&constraint.coefficients, variable_map)?;
    Ok(match constraint.relation {
        Relation::Le => lhs.leq(constraint.rhs),
        Relation::Ge => lhs.geq(constraint.rhs),
        Relation::Eq => lhs.eq(constraint.rhs),
    })
}

fn create_model(problem: UnsolvedProblem) -> impl SolverModel<Error = ResolutionError> {
    problem.using(microlp)
}

fn constrain_all<Model: SolverModel>(model: Model, constraints: Vec<LpConstraint>) -> Model {
    constraints.into_iter().fold(model, |m, c| m.with(c))
}

fn read_values(solution: &impl LpSolution, variable_map: &NameToVariableMap) -> BTreeMap<String, f64> {
    variable_map
        .iter()
        .map(|(name, &var)| (name.clone(), solution.value(var)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DecisionVariable, Objective, PRODUCT_A, PRODUCT_B, production_plan};
    use float_eq::assert_float_eq;
    use std::fs::{read_dir, read_to_string};
    use std::path::Path;

    struct FixedOutput(SolverOutput);

    impl Solver for FixedOutput {
        fn solve(&self, _model: &Model) -> Result<SolverOutput> {
            Ok(self.0.clone())
        }
    }

    fn optimal(a: f64, b: f64, objective_value: f64) -> FixedOutput {
        FixedOutput(SolverOutput {
            status: SolveStatus::Optimal,
            values: BTreeMap::from([(PRODUCT_A.to_owned(), a), (PRODUCT_B.to_owned(), b)]),
            objective_value,
        })
    }

    #[test]
    fn production_plan_optimum() {
        let model = production_plan();
        let solution = solve(&model, &GoodLpSolver, TOLERANCE).unwrap();

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_float_eq!(solution.value(PRODUCT_A).unwrap(), 70.0, abs <= 1e-6);
        assert_float_eq!(solution.value(PRODUCT_B).unwrap(), 15.0, abs <= 1e-6);
        assert_float_eq!(solution.objective_value, 4100.0, abs <= 1e-6);
        assert_eq!(
            model.binding_constraints(&solution.values, TOLERANCE),
            ["Machine_Time_Constraint", "Labor_Time_Constraint"]
        );
    }

    #[test]
    fn solving_twice_gives_the_same_solution() {
        let model = production_plan();
        let first = solve(&model, &GoodLpSolver, TOLERANCE).unwrap();
        let second = solve(&model, &GoodLpSolver, TOLERANCE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn infeasible_model_is_rejected() {
        let model = Model::builder("infeasible")
            .variable(DecisionVariable::continuous("x"))
            .objective(Objective::maximise("profit", [("x", 1.0)]))
            .constraint(Constraint::new("cap", [("x", 1.0)], Relation::Le, 10.0))
            .constraint(Constraint::new("floor", [("x", 1.0)], Relation::Ge, 20.0))
            .build();

        let err = solve(&model, &GoodLpSolver, TOLERANCE).unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::InfeasibleOrUnbounded {
                status: SolveStatus::Infeasible
            }
        ));
    }

    #[test]
    fn unbounded_model_is_rejected() {
        let model = Model::builder("unbounded")
            .variable(DecisionVariable::continuous("x"))
            .objective(Objective::maximise("profit", [("x", 1.0)]))
            .build();

        let err = solve(&model, &GoodLpSolver, TOLERANCE).unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::InfeasibleOrUnbounded {
                status: SolveStatus::Unbounded
            }
        ));
    }

    #[test]
    fn not_solved_status_is_rejected() {
        let solver = FixedOutput(SolverOutput::without_solution(SolveStatus::NotSolved));
        let err = solve(&production_plan(), &solver, TOLERANCE).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no optimal solution: solver reported Not Solved"
        );
    }

    #[test]
    fn infeasible_values_from_solver_are_rejected() {
        let err = solve(&production_plan(), &optimal(80.0, 20.0, 4800.0), TOLERANCE).unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::InfeasibleSolution { ref constraint } if constraint == "Machine_Time_Constraint"
        ));

        let err = solve(&production_plan(), &optimal(-5.0, 0.0, -250.0), TOLERANCE).unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::InfeasibleSolution { ref constraint } if constraint == PRODUCT_A
        ));
    }

    #[test]
    fn missing_variable_in_output_is_rejected() {
        let solver = FixedOutput(SolverOutput {
            status: SolveStatus::Optimal,
            values: BTreeMap::from([(PRODUCT_A.to_owned(), 0.0)]),
            objective_value: 0.0,
        });
        let err = solve(&production_plan(), &solver, TOLERANCE).unwrap_err();
        assert!(matches!(err, OptimizeError::UnknownVariable { ref name } if name == PRODUCT_B));
    }

    #[test]
    fn negative_zero_is_normalised() {
        let solution = solve(&production_plan(), &optimal(-0.0, 50.0, 2000.0), TOLERANCE).unwrap();
        assert!(solution.value(PRODUCT_A).unwrap().is_sign_positive());
    }

    #[test]
    fn undeclared_variable_in_constraint_is_an_error() {
        let model = Model::builder("typo")
            .variable(DecisionVariable::continuous("x"))
            .objective(Objective::maximise("profit", [("x", 1.0)]))
            .constraint(Constraint::new("cap", [("y", 1.0)], Relation::Le, 10.0))
            .build();

        let err = GoodLpSolver.solve(&model).unwrap_err();
        assert!(matches!(err, OptimizeError::UnknownVariable { ref name } if name == "y"));
    }

    #[derive(Deserialize)]
    struct Fixture {
        expected: Solution,
    }

    // Each fixture is a serialized model followed by the expected solution
    fn run_test_file(test_file: &Path) {
        println!("Running test for file: {:?}", test_file);

        let failure_message = format!("Failed to read test file: {}", test_file.display());
        let yaml_content = read_to_string(test_file).expect(&failure_message);

        let parts: Vec<&str> = yaml_content.split("expected:").collect();

        let failure_message = format!("Failed to parse model YAML: {}", test_file.display());
        let model_yaml = parts.first().expect("No model found in test file").trim();
        let model: Model = serde_yaml::from_str(model_yaml).expect(&failure_message);

        let failure_message = format!("Failed to parse expected YAML: {}", test_file.display());
        let expected_yaml = format!("expected:{}", parts.get(1).expect(&failure_message));
        let expected: Fixture = serde_yaml::from_str(&expected_yaml).expect(&failure_message);
        let expected = expected.expected;

        let failure_message = format!("Failed to solve test file: {}", test_file.display());
        let received = solve(&model, &GoodLpSolver, TOLERANCE).expect(&failure_message);

        assert_eq!(expected.status, received.status, "{}", test_file.display());
        assert_eq!(
            expected.values.keys().collect::<Vec<_>>(),
            received.values.keys().collect::<Vec<_>>(),
            "{}",
            test_file.display()
        );
        for (name, &value) in &expected.values {
            assert_float_eq!(value, received.values[name], abs <= 1e-6);
        }
        assert_float_eq!(expected.objective_value, received.objective_value, abs <= 1e-6);
    }

    #[test]
    fn run_all_test_files() {
        let test_data_dir = Path::new("test_data");
        let mut entries: Vec<_> = read_dir(test_data_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.is_file() && path.extension().map(|ext| ext == "yaml").unwrap_or(false)
            })
            .collect();

        entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        for path in entries {
            run_test_file(&path);
        }
    }

    #[test]
    fn production_plan_fixture_matches_builder() {
        let yaml = read_to_string("test_data/production_plan.yaml").unwrap();
        let model_yaml = yaml.split("expected:").next().unwrap();
        let model: Model = serde_yaml::from_str(model_yaml).unwrap();
        assert_eq!(model, production_plan());
    }
}
