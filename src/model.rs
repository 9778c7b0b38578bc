use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PRODUCT_A: &str = "Product_A";
pub const PRODUCT_B: &str = "Product_B";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionVariable {
    pub name: String,
    #[serde(rename = "lowerBound", default)]
    pub lower_bound: f64,
}

impl DecisionVariable {
    /// A continuous variable bounded below by zero
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lower_bound: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    #[serde(alias = "<=")]
    Le,
    #[serde(alias = ">=")]
    Ge,
    #[serde(alias = "==")]
    Eq,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub label: String,
    pub coefficients: BTreeMap<String, f64>,
    pub relation: Relation,
    pub rhs: f64,
}

impl Constraint {
    pub fn new<'a>(
        label: impl Into<String>,
        coefficients: impl IntoIterator<Item = (&'a str, f64)>,
        relation: Relation,
        rhs: f64,
    ) -> Self {
        Self {
            label: label.into(),
            coefficients: collect_coefficients(coefficients),
            relation,
            rhs,
        }
    }

    /// Left-hand side evaluated at `values`. Missing variables count as zero.
    pub fn lhs(&self, values: &BTreeMap<String, f64>) -> f64 {
        weighted_sum(&self.coefficients, values)
    }

    /// Distance between the left-hand side and the bound, always >= 0 when satisfied
    pub fn slack(&self, values: &BTreeMap<String, f64>) -> f64 {
        let lhs = self.lhs(values);
        match self.relation {
            Relation::Le => self.rhs - lhs,
            Relation::Ge => lhs - self.rhs,
            Relation::Eq => -(lhs - self.rhs).abs(),
        }
    }

    pub fn is_satisfied(&self, values: &BTreeMap<String, f64>, tolerance: f64) -> bool {
        self.slack(values) >= -tolerance
    }

    pub fn is_binding(&self, values: &BTreeMap<String, f64>, tolerance: f64) -> bool {
        (self.lhs(values) - self.rhs).abs() <= tolerance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sense {
    Maximise,
    Minimise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub label: String,
    pub coefficients: BTreeMap<String, f64>,
    pub sense: Sense,
}

impl Objective {
    pub fn maximise<'a>(
        label: impl Into<String>,
        coefficients: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Self {
        Self {
            label: label.into(),
            coefficients: collect_coefficients(coefficients),
            sense: Sense::Maximise,
        }
    }

    pub fn minimise<'a>(
        label: impl Into<String>,
        coefficients: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Self {
        Self {
            sense: Sense::Minimise,
            ..Self::maximise(label, coefficients)
        }
    }
}

/// A linear program: one objective, ordered variables and ordered constraints.
///
/// Built once through [`ModelBuilder`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    variables: Vec<DecisionVariable>,
    objective: Objective,
    constraints: Vec<Constraint>,
}

impl Model {
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            variables: Vec::new(),
            objective: None,
            constraints: Vec::new(),
        }
    }

    pub fn variables(&self) -> &[DecisionVariable] {
        &self.variables
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective_value(&self, values: &BTreeMap<String, f64>) -> f64 {
        weighted_sum(&self.objective.coefficients, values)
    }

    /// First constraint or variable bound broken by `values`, if any
    pub fn first_violation(&self, values: &BTreeMap<String, f64>, tolerance: f64) -> Option<&str> {
        let bound = self.variables.iter().find(|var| {
            values.get(&var.name).copied().unwrap_or(0.0) < var.lower_bound - tolerance
        });
        if let Some(var) = bound {
            return Some(var.name.as_str());
        }

        self.constraints
            .iter()
            .find(|c| !c.is_satisfied(values, tolerance))
            .map(|c| c.label.as_str())
    }

    pub fn is_feasible(&self, values: &BTreeMap<String, f64>, tolerance: f64) -> bool {
        self.first_violation(values, tolerance).is_none()
    }

    /// Labels of the constraints that hold with equality at `values`
    pub fn binding_constraints(&self, values: &BTreeMap<String, f64>, tolerance: f64) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|c| c.is_binding(values, tolerance))
            .map(|c| c.label.as_str())
            .collect()
    }
}

pub struct ModelBuilder {
    name: String,
    variables: Vec<DecisionVariable>,
    objective: Option<Objective>,
    constraints: Vec<Constraint>,
}

impl ModelBuilder {
    pub fn variable(mut self, variable: DecisionVariable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn objective(mut self, objective: Objective) -> Self {
        self.objective = Some(objective);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Finish the model. Without an objective the model maximises zero.
    pub fn build(self) -> Model {
        let objective = self
            .objective
            .unwrap_or_else(|| Objective::maximise("objective", Vec::<(&str, f64)>::new()));
        Model {
            name: self.name,
            variables: self.variables,
            objective,
            constraints: self.constraints,
        }
    }
}

/// The weekly production problem: machine and labor hours shared by two products.
pub fn production_plan() -> Model {
    Model::builder("Maximize_Profit")
        .variable(DecisionVariable::continuous(PRODUCT_A))
        .variable(DecisionVariable::continuous(PRODUCT_B))
        .objective(Objective::maximise(
            "Total_Profit",
            [(PRODUCT_A, 50.0), (PRODUCT_B, 40.0)],
        ))
        .constraint(Constraint::new(
            "Machine_Time_Constraint",
            [(PRODUCT_A, 3.0), (PRODUCT_B, 2.0)],
            Relation::Le,
            240.0,
        ))
        .constraint(Constraint::new(
            "Labor_Time_Constraint",
            [(PRODUCT_A, 1.0), (PRODUCT_B, 2.0)],
            Relation::Le,
            100.0,
        ))
        .build()
}

fn collect_coefficients<'a>(
    coefficients: impl IntoIterator<Item = (&'a str, f64)>,
) -> BTreeMap<String, f64> {
    let mut map = BTreeMap::new();
    for (name, coefficient) in coefficients {
        *map.entry(name.to_owned()).or_insert(0.0) += coefficient;
    }
    map
}

fn weighted_sum(coefficients: &BTreeMap<String, f64>, values: &BTreeMap<String, f64>) -> f64 {
    coefficients
        .iter()
        .map(|(name, coefficient)| coefficient * values.get(name).copied().unwrap_or(0.0))
        .sum()
}
