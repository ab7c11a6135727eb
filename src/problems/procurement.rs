//! Combined supplier selection and purchasing.

use crate::compile::{CompileConfig, Compiled, Compiler};
use crate::error::{QuboError, Result};
use crate::penalty::{LinearExpr, PenaltyBlock};
use crate::registry::VarKey;
use crate::solve::Solution;

use super::set_cover::add_coverage;

/// Pick suppliers and purchase quantities to maximize sale value minus
/// supplier fees, spending at most `budget` on purchases.
///
/// Every item must be offered by at least one selected supplier (a set
/// cover over items with suppliers as the sets), and an item can only be
/// bought from a selected supplier.
///
/// # Formulation
///
/// - `Supplier(s)`: binary selection flag.
/// - `Purchase { item, supplier }`: quantity in `0..=bounds[item]`,
///   declared only where `costs[item][supplier]` is available.
/// - Coverage blocks per item, as in [`SetCover`](super::SetCover).
/// - One `AtMost` budget block over purchase costs.
/// - One `Linking` block per supplier: `A·Σ_i q_{i,s}·(1 − y_s)`.
/// - Objective `Σ fee_s·y_s − Σ value_i·q_{i,s}`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Procurement {
    /// `costs[item][supplier]`; `None` when the supplier does not offer it.
    pub costs: Vec<Vec<Option<i64>>>,
    /// Sale value of one unit of each item.
    pub values: Vec<i64>,
    /// Largest quantity of each item bought from any one supplier.
    pub bounds: Vec<i64>,
    /// Fixed fee for selecting each supplier.
    pub fees: Vec<i64>,
    pub budget: i64,
}

/// Lagrange weights for [`Procurement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcurementWeights {
    pub coverage: i64,
    pub budget: i64,
    pub linking: i64,
}

impl ProcurementWeights {
    /// One weight for every block, meeting `A > B·max(|value|, |fee|)`.
    pub fn for_problem(problem: &Procurement, config: &CompileConfig) -> Self {
        let max = problem
            .values
            .iter()
            .chain(&problem.fees)
            .map(|c| c.abs())
            .max()
            .unwrap_or(0);
        let weight = config.objective_weight.saturating_mul(max).saturating_add(1);
        Self {
            coverage: weight,
            budget: weight,
            linking: weight,
        }
    }
}

/// One purchase line of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PurchaseLine {
    pub item: usize,
    pub supplier: usize,
    pub quantity: u64,
    /// Quantity times unit cost.
    pub cost: i64,
}

/// Decoded procurement plan.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcurementPlan {
    /// Selected suppliers, ascending.
    pub suppliers: Vec<usize>,
    /// Non-zero purchases in (item, supplier) order.
    pub purchases: Vec<PurchaseLine>,
    pub purchase_cost: i64,
    pub fees: i64,
    pub sale_value: i64,
}

impl ProcurementPlan {
    /// Sale value minus supplier fees.
    pub fn profit(&self) -> i64 {
        self.sale_value - self.fees
    }

    /// Whether every purchase comes from a selected supplier.
    pub fn is_consistent(&self) -> bool {
        self.purchases
            .iter()
            .all(|line| self.suppliers.contains(&line.supplier))
    }
}

impl Procurement {
    pub fn num_items(&self) -> usize {
        self.values.len()
    }

    pub fn num_suppliers(&self) -> usize {
        self.fees.len()
    }

    /// Unit cost of `item` at `supplier`, if offered.
    pub fn cost(&self, item: usize, supplier: usize) -> Option<i64> {
        self.costs.get(item)?.get(supplier).copied().flatten()
    }

    /// Available (item, supplier, unit cost) triples in table order.
    fn offers(&self) -> impl Iterator<Item = (usize, usize, i64)> + '_ {
        self.costs.iter().enumerate().flat_map(|(item, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(supplier, cost)| cost.map(|c| (item, supplier, c)))
        })
    }

    pub fn validate(&self) -> Result<()> {
        let (items, suppliers) = (self.num_items(), self.num_suppliers());
        if self.costs.len() != items || self.bounds.len() != items {
            return Err(QuboError::InvalidProblem(format!(
                "{items} values, {} cost rows and {} bounds",
                self.costs.len(),
                self.bounds.len()
            )));
        }
        if let Some(item) = self.costs.iter().position(|row| row.len() != suppliers) {
            return Err(QuboError::InvalidProblem(format!(
                "cost row of item {item} has {} entries for {suppliers} suppliers",
                self.costs[item].len()
            )));
        }
        if let Some((item, supplier, cost)) = self.offers().find(|&(_, _, c)| c < 0) {
            return Err(QuboError::InvalidProblem(format!(
                "item {item} at supplier {supplier} has negative cost {cost}"
            )));
        }
        if let Some(item) = self.costs.iter().position(|row| row.iter().all(Option::is_none)) {
            return Err(QuboError::InvalidProblem(format!(
                "item {item} is not offered by any supplier"
            )));
        }
        if self.budget < 0 {
            return Err(QuboError::InvalidProblem(format!(
                "budget must be non-negative, got {}",
                self.budget
            )));
        }
        Ok(())
    }

    pub fn compile(
        &self,
        weights: &ProcurementWeights,
        config: &CompileConfig,
    ) -> Result<Compiled> {
        self.validate()?;
        let mut compiler = Compiler::new(config.clone())?;

        for s in 0..self.num_suppliers() {
            compiler.declare_binary(VarKey::Supplier(s))?;
        }
        for (item, supplier, _) in self.offers() {
            compiler.declare(VarKey::Purchase { item, supplier }, self.bounds[item])?;
        }

        let mut objective: LinearExpr = self
            .fees
            .iter()
            .enumerate()
            .map(|(s, &fee)| (VarKey::Supplier(s), fee))
            .collect();
        for (item, supplier, _) in self.offers() {
            objective.push(VarKey::Purchase { item, supplier }, -self.values[item]);
        }
        compiler.add_objective(objective)?;

        for item in 0..self.num_items() {
            let carriers: Vec<VarKey> = (0..self.num_suppliers())
                .filter(|&s| self.cost(item, s).is_some())
                .map(VarKey::Supplier)
                .collect();
            add_coverage(&mut compiler, item, &carriers, weights.coverage)?;
        }

        let spend: LinearExpr = self
            .offers()
            .map(|(item, supplier, cost)| (VarKey::Purchase { item, supplier }, cost))
            .collect();
        compiler.add_block(PenaltyBlock::at_most(
            "budget",
            spend,
            self.budget,
            weights.budget,
        ))?;

        for s in 0..self.num_suppliers() {
            let bought = LinearExpr::sum(
                self.offers()
                    .filter(|&(_, supplier, _)| supplier == s)
                    .map(|(item, supplier, _)| VarKey::Purchase { item, supplier }),
            );
            if bought.is_empty() {
                continue;
            }
            compiler.add_block(PenaltyBlock::linking(
                format!("supplier[{s}]"),
                bought,
                VarKey::Supplier(s),
                weights.linking,
            ))?;
        }

        Ok(compiler.finish())
    }

    pub fn interpret(&self, solution: &Solution) -> ProcurementPlan {
        let suppliers: Vec<usize> = (0..self.num_suppliers())
            .filter(|&s| solution.is_set(&VarKey::Supplier(s)))
            .collect();
        let purchases: Vec<PurchaseLine> = self
            .offers()
            .filter_map(|(item, supplier, cost)| {
                let quantity = solution.value(&VarKey::Purchase { item, supplier })?;
                (quantity > 0).then_some(PurchaseLine {
                    item,
                    supplier,
                    quantity,
                    cost: cost * quantity as i64,
                })
            })
            .collect();

        ProcurementPlan {
            purchase_cost: purchases.iter().map(|l| l.cost).sum(),
            fees: suppliers.iter().map(|&s| self.fees[s]).sum(),
            sale_value: purchases
                .iter()
                .map(|l| self.values[l.item] * l.quantity as i64)
                .sum(),
            suppliers,
            purchases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anneal::SimulatedAnnealer;
    use crate::encode::EncodingMode;
    use crate::solve::{ExactSolver, SolveParams, SolverAdapter};

    /// Item 0 only at supplier 0; item 1 at both, cheaper at supplier 1.
    fn two_by_two(fees: Vec<i64>) -> Procurement {
        Procurement {
            costs: vec![vec![Some(2), None], vec![Some(3), Some(1)]],
            values: vec![5, 4],
            bounds: vec![1, 2],
            fees,
            budget: 5,
        }
    }

    fn compile(problem: &Procurement, mode: EncodingMode) -> Compiled {
        let config = CompileConfig::default().with_encoding(mode);
        let weights = ProcurementWeights::for_problem(problem, &config);
        problem.compile(&weights, &config).unwrap()
    }

    #[test]
    fn test_buys_from_cheaper_supplier() {
        let problem = two_by_two(vec![1, 1]);
        let compiled = compile(&problem, EncodingMode::Binary);
        assert_eq!(compiled.model().num_pieces(), 13);
        assert!(compiled.calibration().is_sufficient());

        let solution =
            SolverAdapter::solve(&compiled, &ExactSolver::new(), &SolveParams::default()).unwrap();
        assert!(compiled.verify(&solution).is_ok());
        assert_eq!(solution.energy, -173);
        assert_eq!(solution.value(&VarKey::Slack(0)), Some(1));

        let plan = problem.interpret(&solution);
        assert_eq!(plan.suppliers, vec![0, 1]);
        assert_eq!(
            plan.purchases,
            vec![
                PurchaseLine { item: 0, supplier: 0, quantity: 1, cost: 2 },
                PurchaseLine { item: 1, supplier: 1, quantity: 2, cost: 2 },
            ]
        );
        assert_eq!(plan.purchase_cost, 4);
        assert_eq!(plan.profit(), 11);
        assert!(plan.is_consistent());
    }

    #[test]
    fn test_expensive_supplier_skipped() {
        let problem = two_by_two(vec![1, 10]);
        let compiled = compile(&problem, EncodingMode::Binary);
        let solution =
            SolverAdapter::solve(&compiled, &ExactSolver::new(), &SolveParams::default()).unwrap();
        assert!(compiled.verify(&solution).is_ok());
        assert_eq!(solution.energy, -305);

        let plan = problem.interpret(&solution);
        assert_eq!(plan.suppliers, vec![0]);
        assert_eq!(plan.purchase_cost, 5);
        assert_eq!(plan.profit(), 8);
    }

    #[test]
    fn test_discrete_mode_same_plan() {
        let problem = two_by_two(vec![1, 1]);
        let compiled = compile(&problem, EncodingMode::Discrete);
        assert_eq!(compiled.model().num_pieces(), 9);

        let solution =
            SolverAdapter::solve(&compiled, &ExactSolver::new(), &SolveParams::default()).unwrap();
        assert_eq!(solution.energy, -173);
        assert_eq!(problem.interpret(&solution).profit(), 11);
    }

    #[test]
    fn test_annealer_on_combined_model() {
        let problem = two_by_two(vec![1, 1]);
        let compiled = compile(&problem, EncodingMode::Binary);
        let params = SolveParams::default()
            .with_num_reads(20)
            .with_num_sweeps(2000)
            .with_seed(7);
        let solution =
            SolverAdapter::solve(&compiled, &SimulatedAnnealer::default(), &params).unwrap();
        assert!(compiled.verify(&solution).is_ok());
        assert_eq!(solution.energy, -173);
    }

    #[test]
    fn test_linking_block_per_offering_supplier() {
        let problem = two_by_two(vec![1, 1]);
        let compiled = compile(&problem, EncodingMode::Binary);
        let linking: Vec<&str> = compiled
            .blocks()
            .iter()
            .map(|b| b.block.label())
            .filter(|l| l.starts_with("supplier"))
            .collect();
        assert_eq!(linking, vec!["supplier[0]", "supplier[1]"]);
    }

    #[test]
    fn test_item_without_supplier() {
        let mut problem = two_by_two(vec![1, 1]);
        problem.costs[0] = vec![None, None];
        assert!(matches!(
            problem.validate(),
            Err(QuboError::InvalidProblem(ref m)) if m.contains("item 0")
        ));
    }

    #[test]
    fn test_ragged_cost_table() {
        let mut problem = two_by_two(vec![1, 1]);
        problem.costs[1].push(Some(4));
        assert!(matches!(
            problem.validate(),
            Err(QuboError::InvalidProblem(_))
        ));
    }

    #[test]
    fn test_compilation_is_idempotent() {
        let problem = two_by_two(vec![1, 1]);
        let a = compile(&problem, EncodingMode::Binary);
        let b = compile(&problem, EncodingMode::Binary);
        assert_eq!(a.model(), b.model());
        assert_eq!(a.encodings(), b.encodings());
    }
}
