use std::collections::HashMap;

use derive_more::Display;
use grb::prelude::*;
use grb::{add_binvar, add_intvar, Status};
use itertools::iproduct;
use log::info;

use crate::models::multimodal::sets_and_parameters::{Parameters, Sets};
use crate::models::multimodal::warehouse;
use crate::models::utils::ConvertVars;
use crate::problem::{PortIndex, ShipmentIndex, TimeIndex};

/// Tuning knobs for the assembled program.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Weight of the secondary objective term on total arrival time, which
    /// breaks cost ties in favor of earlier delivery. Zero disables it.
    pub arrival_tiebreak: f64,
    /// Show the solver log
    pub solver_output: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            arrival_tiebreak: 1e-4,
            solver_output: false,
        }
    }
}

pub struct MultimodalSolver {}

impl MultimodalSolver {
    pub fn build(
        sets: &Sets,
        parameters: &Parameters,
        config: &ModelConfig,
    ) -> Result<(Model, Variables), SolveError> {
        info!("Building multimodal routing model.");

        let mut model = Model::new("multimodal_routing")?;
        if !config.solver_output {
            model.set_param(param::OutputFlag, 0)?;
        }

        //*****************CREATE VARIABLES*****************//

        // Variables exist only on the sparse (leg, departure date) support.
        let mut x: HashMap<(PortIndex, PortIndex, TimeIndex, ShipmentIndex), Var> = HashMap::new();
        let mut y: HashMap<(PortIndex, PortIndex, TimeIndex), Var> = HashMap::new();
        let mut z: HashMap<(PortIndex, PortIndex, TimeIndex), Var> = HashMap::new();

        for leg in &sets.L {
            let (i, j) = (leg.from(), leg.to());
            for &t in leg.departures() {
                // number of containers reserved on the leg on date t
                y.insert(
                    (i, j, t),
                    add_intvar!(model, name: &format!("y_{i}_{j}_{t}"), bounds: 0..)?,
                );
                // 1 if the leg carries any shipment on date t
                z.insert(
                    (i, j, t),
                    add_binvar!(model, name: &format!("z_{i}_{j}_{t}"))?,
                );
                for &k in &sets.K {
                    // 1 if shipment k departs on the leg on date t
                    x.insert(
                        (i, j, t, k),
                        add_binvar!(model, name: &format!("x_{i}_{j}_{t}_{k}"))?,
                    );
                }
            }
        }

        model.update()?;

        // The registries outlive this function; expression building below
        // only ever borrows them.
        let (xs, ys, zs) = (&x, &y, &z);

        // Term counts of the flow marginals. A sum over an empty support is a
        // constant, and constraints over such sums are classified up front:
        // trivially true ones are omitted, trivially false ones are reported
        // as instance infeasibility instead of being handed to the solver.
        let out_terms = |i: PortIndex| {
            sets.Fs[i]
                .iter()
                .map(|&l| sets.L[l].departures().len())
                .sum::<usize>()
        };
        let in_terms = |j: PortIndex| {
            sets.Rs[j]
                .iter()
                .map(|&l| sets.L[l].departures().len())
                .sum::<usize>()
        };

        let outflow = |i: PortIndex, k: ShipmentIndex| {
            sets.Fs[i]
                .iter()
                .flat_map(|&l| {
                    let leg = &sets.L[l];
                    leg.departures()
                        .iter()
                        .map(move |&t| xs[&(leg.from(), leg.to(), t, k)])
                })
                .grb_sum()
        };
        let inflow = |j: PortIndex, k: ShipmentIndex| {
            sets.Rs[j]
                .iter()
                .flat_map(|&l| {
                    let leg = &sets.L[l];
                    leg.departures()
                        .iter()
                        .map(move |&t| xs[&(leg.from(), leg.to(), t, k)])
                })
                .grb_sum()
        };

        // dwell times, destination arrivals and warehousing cost as affine
        // expressions over the flows
        let fees = warehouse::fees(sets, parameters, |i, j, t, k| Expr::from(xs[&(i, j, t, k)]));

        //*****************ADD CONSTRAINTS*****************//

        // ROUTING

        for &k in &sets.K {
            let (origin, destination) = (parameters.origin[k], parameters.destination[k]);

            // every shipment leaves its origin and reaches its destination
            // exactly once
            if out_terms(origin) == 0 {
                return Err(SolveError::TriviallyInfeasible {
                    shipment: k,
                    reason: "no leg ever departs its origin".to_string(),
                });
            }
            model.add_constr(&format!("origin_{k}"), c!(outflow(origin, k) == 1.0))?;

            if in_terms(destination) == 0 {
                return Err(SolveError::TriviallyInfeasible {
                    shipment: k,
                    reason: "no leg ever reaches its destination".to_string(),
                });
            }
            model.add_constr(&format!("destination_{k}"), c!(inflow(destination, k) == 1.0))?;

            // no flow back into the origin, no flow onward from the destination
            if in_terms(origin) > 0 {
                model.add_constr(&format!("no_return_{k}"), c!(inflow(origin, k) == 0.0))?;
            }
            if out_terms(destination) > 0 {
                model.add_constr(&format!("no_onward_{k}"), c!(outflow(destination, k) == 0.0))?;
            }

            // what flows into a transit port flows out of it again
            for &j in &sets.P {
                if j == origin || j == destination {
                    continue;
                }
                if in_terms(j) + out_terms(j) == 0 {
                    continue;
                }
                model.add_constr(
                    &format!("transit_{j}_{k}"),
                    c!(inflow(j, k) == outflow(j, k)),
                )?;
            }

            // a shipment passes any port at most once, in each direction
            for &i in &sets.P {
                if out_terms(i) > 0 {
                    model.add_constr(&format!("single_out_{i}_{k}"), c!(outflow(i, k) <= 1.0))?;
                }
                if in_terms(i) > 0 {
                    model.add_constr(&format!("single_in_{i}_{k}"), c!(inflow(i, k) <= 1.0))?;
                }
            }
        }

        // TIMING

        // a shipment cannot depart a port before it has arrived there, nor
        // depart its origin before its order date
        for (&j, &k) in iproduct!(&sets.P, &sets.K) {
            // ports the shipment can neither enter nor leave reduce to 0 >= 0
            let relevant =
                out_terms(j) > 0 || (j != parameters.destination[k] && in_terms(j) > 0);
            if relevant {
                model.add_constr(
                    &format!("dwell_{j}_{k}"),
                    c!(fees.stay[j][k].clone() >= 0.0),
                )?;
            }
        }

        for &k in &sets.K {
            let release = parameters.start_time[k];
            if release == 0 {
                continue;
            }
            let early = sets.Fs[parameters.origin[k]]
                .iter()
                .flat_map(|&l| {
                    let leg = &sets.L[l];
                    leg.departures()
                        .iter()
                        .filter(move |&&t| t < release)
                        .map(move |&t| xs[&(leg.from(), leg.to(), t, k)])
                })
                .collect::<Vec<_>>();
            if !early.is_empty() {
                model.add_constr(&format!("release_{k}"), c!(early.iter().grb_sum() == 0.0))?;
            }
        }

        // every shipment arrives at its destination no later than its deadline
        for &k in &sets.K {
            model.add_constr(
                &format!("deadline_{k}"),
                c!(fees.arrival[k].clone() <= parameters.deadline[k] as f64),
            )?;
        }

        // CAPACITY

        let goods = sets.K.len() as f64;
        for leg in &sets.L {
            let (i, j) = (leg.from(), leg.to());
            let ctn = parameters.container_volume[&(i, j)];
            for &t in leg.departures() {
                // enough containers for the volume on the leg that day
                let load = sets
                    .K
                    .iter()
                    .map(|&k| parameters.volume[k] * xs[&(i, j, t, k)])
                    .grb_sum();
                model.add_constr(
                    &format!("containers_{i}_{j}_{t}"),
                    c!(ctn * ys[&(i, j, t)] >= load),
                )?;

                // any flow on the leg that day forces the usage indicator.
                // the count of shipments never exceeds |K|, so dividing by it
                // keeps the forcing coefficient valid at every load level
                let count = sets.K.iter().map(|&k| xs[&(i, j, t, k)]).grb_sum();
                model.add_constr(
                    &format!("used_{i}_{j}_{t}"),
                    c!(goods * zs[&(i, j, t)] >= count),
                )?;
            }
        }

        //*****************SET OBJECTIVE*****************//

        let freight = sets
            .L
            .iter()
            .flat_map(|leg| {
                leg.departures().iter().map(move |&t| {
                    let key = (leg.from(), leg.to(), t);
                    parameters.transport_cost[&key] * ys[&key]
                        + parameters.fixed_cost[&key] * zs[&key]
                })
            })
            .grb_sum();

        let duty = iproduct!(&sets.L, &sets.K)
            .map(|(leg, &k)| {
                let rate = parameters.transit_duty[&(leg.from(), leg.to())];
                leg.departures()
                    .iter()
                    .map(|&t| rate * parameters.value[k] * xs[&(leg.from(), leg.to(), t, k)])
                    .grb_sum()
            })
            .grb_sum();

        // the tax on order values does not depend on routing
        let tax: f64 = sets
            .K
            .iter()
            .map(|&k| parameters.tax_rate[k] * parameters.value[k])
            .sum();

        let tiebreak = if config.arrival_tiebreak == 0.0 {
            Expr::Constant(0.0)
        } else {
            config.arrival_tiebreak
                * sets
                    .K
                    .iter()
                    .map(|&k| fees.arrival[k].clone())
                    .grb_sum()
        };

        model.set_objective(
            freight + duty + fees.cost.clone() + tiebreak + Expr::Constant(tax),
            Minimize,
        )?;

        model.update()?;

        info!(
            "Successfully built multimodal routing model with {} flow variables",
            x.len()
        );

        Ok((model, Variables { x, y, z }))
    }

    /// Build and optimize the program, returning the solved variable values.
    pub fn solve(
        sets: &Sets,
        parameters: &Parameters,
        config: &ModelConfig,
    ) -> Result<SolvedRouting, SolveError> {
        let (m, variables) = MultimodalSolver::build(sets, parameters, config)?;
        let mut model = m;

        model.optimize()?;

        match model.status()? {
            Status::Optimal | Status::SubOptimal => SolvedRouting::new(&variables, &model),
            Status::Infeasible | Status::InfOrUnbd => Err(SolveError::Infeasible),
            Status::Unbounded => Err(SolveError::Unbounded),
            status => Err(SolveError::UnexpectedStatus(status)),
        }
    }
}

/// The decision variables of one model instance.
pub struct Variables {
    /// 1 if shipment k departs port i for port j on date t
    pub x: HashMap<(PortIndex, PortIndex, TimeIndex, ShipmentIndex), Var>,
    /// Number of containers reserved on leg (i, j) on date t
    pub y: HashMap<(PortIndex, PortIndex, TimeIndex), Var>,
    /// 1 if leg (i, j) carries any shipment on date t
    pub z: HashMap<(PortIndex, PortIndex, TimeIndex), Var>,
}

/// Solved variable values, on the same sparse support as the variables.
pub struct SolvedRouting {
    pub x: HashMap<(PortIndex, PortIndex, TimeIndex, ShipmentIndex), f64>,
    pub y: HashMap<(PortIndex, PortIndex, TimeIndex), f64>,
    pub z: HashMap<(PortIndex, PortIndex, TimeIndex), f64>,
    pub objective: f64,
}

impl SolvedRouting {
    pub fn new(variables: &Variables, model: &Model) -> Result<SolvedRouting, SolveError> {
        Ok(SolvedRouting {
            x: variables.x.convert(model)?,
            y: variables.y.convert(model)?,
            z: variables.z.convert(model)?,
            objective: model.get_attr(attr::ObjVal)?,
        })
    }
}

#[derive(Debug, Display)]
pub enum SolveError {
    /// The variable support alone rules out routing this shipment
    #[display(fmt = "shipment {} cannot be routed: {}", shipment, reason)]
    TriviallyInfeasible {
        shipment: ShipmentIndex,
        reason: String,
    },
    /// The assembled program has no feasible assignment
    #[display(fmt = "the model is infeasible")]
    Infeasible,
    /// The assembled program is unbounded
    #[display(fmt = "the model is unbounded")]
    Unbounded,
    /// The solver stopped without an optimal assignment
    #[display(fmt = "the solver stopped with status {:?}", _0)]
    UnexpectedStatus(Status),
    /// The solver itself failed
    #[display(fmt = "solver error: {}", _0)]
    Solver(grb::Error),
}

impl std::error::Error for SolveError {}

impl From<grb::Error> for SolveError {
    fn from(error: grb::Error) -> Self {
        SolveError::Solver(error)
    }
}
