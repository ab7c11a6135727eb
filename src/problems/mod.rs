//! Ready-made problem builders.
//!
//! Each builder validates its description, compiles it into a
//! [`Compiled`](crate::compile::Compiled) model with explicit Lagrange
//! weights, and turns a decoded [`Solution`](crate::solve::Solution) back
//! into a typed report.
//!
//! - [`SetCover`]: Lucas's coverage formulation with count indicators.
//! - [`Knapsack`]: bounded quantities under one budget.
//! - [`Procurement`]: supplier cover, budget and supplier/purchase
//!   linking in one model.
//!
//! `*Weights::for_problem` picks the smallest weights meeting the
//! sufficient condition `A > B·max|objective coefficient|`.

mod knapsack;
mod procurement;
mod set_cover;

pub use knapsack::{Knapsack, KnapsackSelection, KnapsackWeights};
pub use procurement::{Procurement, ProcurementPlan, ProcurementWeights, PurchaseLine};
pub use set_cover::{CoverSelection, SetCover, SetCoverWeights};
