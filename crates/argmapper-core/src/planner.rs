//! Resolution planning: find ordered chains of converters that can produce a
//! target's keys from a base environment.
//!
//! # Search
//!
//! A forward pass first fires every converter whose inputs are available,
//! starting from the base environment, until nothing new appears. Keys it
//! never reaches have no derivation under any search order, so they are
//! reported as unsatisfiable up front and never expanded.
//!
//! Every other required key not present in the base environment is a goal.
//! A goal is satisfied by ANY converter that outputs it (OR node), and a
//! converter is usable only if ALL of its inputs are satisfied (AND node).
//! The search is a depth-first walk over that AND/OR graph:
//!
//! - Inputs of a converter are expanded in [`ArgKey`] order.
//! - A goal that is already being derived higher up the stack is a cycle: the
//!   branch is cut rather than recursed into.
//! - Results per goal are memoized for the planning pass. A goal whose search
//!   was cut at some ancestors is memoized together with that set of
//!   ancestors, and reused only while all of them are on the stack again.
//!
//! Each alternative is a sub-plan: a topologically ordered list of converters
//! that derives the goal from the base environment. Sub-plans for sibling
//! inputs are combined by concatenation, skipping converters already present.
//! Combined chains are then normalized (redundant and dead steps removed) and
//! deduplicated, preserving first-seen order.
//!
//! # Ordering and bounds
//!
//! A goal's alternatives are taken round-robin across its producers in
//! registration order: the first alternative of every producer, then the
//! second of every producer, and so on. Sibling alternatives are combined
//! starting with the first alternative of each sibling, then every single
//! sibling varied on its own, then the remaining combinations in
//! lexicographic order. Every alternative of every goal is thus planned
//! before alternatives start being recombined.
//!
//! Each list is bounded by `max_chains`, and the number of goal expansions is
//! bounded too; past that bound a goal falls back to the derivation found by
//! the forward pass. Any bound that drops a candidate sets
//! [`Plan::truncated`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use argmapper_types::{ArgKey, Environment};
use tracing::{debug, trace};

use crate::converter::{Converter, ConverterId};
use crate::target::Target;

/// An ordered sequence of converters. Each step's inputs are available from
/// the base environment or an earlier step's outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Chain {
    steps: Vec<ConverterId>,
}

impl Chain {
    pub fn new(steps: Vec<ConverterId>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[ConverterId] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn contains(&self, id: ConverterId) -> bool {
        self.steps.contains(&id)
    }

    /// Append `other`'s steps that are not already part of this chain.
    fn merged(&self, other: &Chain) -> Chain {
        let mut steps = self.steps.clone();
        for step in &other.steps {
            if !steps.contains(step) {
                steps.push(*step);
            }
        }
        Chain { steps }
    }

    /// Converter names for this chain, in step order.
    pub fn names(&self, converters: &[Converter]) -> Vec<String> {
        self.steps
            .iter()
            .map(|id| {
                converters
                    .get(id.0)
                    .map(|c| c.name().to_string())
                    .unwrap_or_else(|| id.to_string())
            })
            .collect()
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, "[]");
        }
        let steps: Vec<String> = self.steps.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", steps.join(" -> "))
    }
}

/// A required key for which no chain exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsatisfiable {
    /// The required key.
    pub key: ArgKey,
    /// Keys reached during the search that had neither a base value nor a producer.
    pub unresolved: Vec<ArgKey>,
    /// Keys whose derivation was cut because it led back to itself.
    pub cycles: Vec<ArgKey>,
}

/// Output of a planning pass.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    /// Candidate chains in the order they should be attempted.
    pub chains: Vec<Chain>,
    /// Required keys that could not be planned. Non-empty means `chains` is empty.
    pub unsatisfiable: Vec<Unsatisfiable>,
    /// A bound dropped candidates, so `chains` is not every way to resolve the target.
    pub truncated: bool,
}

impl Plan {
    pub fn is_feasible(&self) -> bool {
        self.unsatisfiable.is_empty() && !self.chains.is_empty()
    }
}

/// Every way of deriving one goal that survived the bounds.
#[derive(Debug, Default)]
struct Derivation {
    alternatives: Vec<Chain>,
    truncated: bool,
}

impl Derivation {
    /// The goal is already in the base environment.
    fn present() -> Self {
        Self {
            alternatives: vec![Chain::default()],
            truncated: false,
        }
    }
}

/// Walk state for explaining an unsatisfiable key.
#[derive(Default)]
struct Diagnosis {
    path: Vec<ArgKey>,
    done: BTreeSet<ArgKey>,
    unresolved: BTreeSet<ArgKey>,
    cycles: BTreeSet<ArgKey>,
}

/// A derivation computed with its search cut at the given ancestors.
type CutEntry = (BTreeSet<ArgKey>, Rc<Derivation>);

/// Plans candidate chains for one target against one base environment.
///
/// Memoization is local to a `Planner`, so build a fresh one per resolution.
pub struct Planner<'a> {
    converters: &'a [Converter],
    base: &'a Environment,
    max_chains: usize,
    producers: BTreeMap<&'a ArgKey, Vec<ConverterId>>,
    /// First producer of each key reached by the forward pass.
    witnesses: HashMap<&'a ArgKey, ConverterId>,
    memo: HashMap<ArgKey, Rc<Derivation>>,
    cut_memo: HashMap<ArgKey, Vec<CutEntry>>,
    visiting: Vec<ArgKey>,
    expansions: usize,
    max_expansions: usize,
}

impl<'a> Planner<'a> {
    pub fn new(converters: &'a [Converter], base: &'a Environment, max_chains: usize) -> Self {
        let max_chains = max_chains.max(1);
        let mut producers: BTreeMap<&'a ArgKey, Vec<ConverterId>> = BTreeMap::new();
        for (idx, converter) in converters.iter().enumerate() {
            for key in converter.outputs() {
                producers.entry(key).or_default().push(ConverterId(idx));
            }
        }
        Self {
            converters,
            base,
            max_chains,
            witnesses: forward_pass(converters, base),
            memo: HashMap::new(),
            cut_memo: HashMap::new(),
            visiting: Vec::new(),
            expansions: 0,
            max_expansions: max_chains.saturating_mul(producers.len() + 1),
            producers,
        }
    }

    /// Plan every candidate chain for `target`.
    pub fn plan(&mut self, target: &Target) -> Plan {
        let unsatisfiable: Vec<Unsatisfiable> = target
            .required()
            .iter()
            .filter(|goal| !self.derivable(goal))
            .map(|goal| self.diagnose(goal))
            .collect();

        if !unsatisfiable.is_empty() {
            debug!(
                target = %target,
                unsatisfiable = unsatisfiable.len(),
                "no feasible chain"
            );
            return Plan {
                chains: Vec::new(),
                unsatisfiable,
                truncated: false,
            };
        }

        let derivations: Vec<Rc<Derivation>> = target
            .required()
            .iter()
            .map(|goal| self.derive(goal).0)
            .collect();
        let groups: Vec<&[Chain]> = derivations
            .iter()
            .map(|d| d.alternatives.as_slice())
            .collect();
        let (partials, cut_short) = self.product(&groups);
        let truncated = cut_short || derivations.iter().any(|d| d.truncated);

        let mut chains: Vec<Chain> = Vec::with_capacity(partials.len());
        for partial in partials {
            let chain = self.normalize(partial, target);
            if !chains.contains(&chain) {
                chains.push(chain);
            }
        }

        if truncated {
            debug!(
                target = %target,
                max_chains = self.max_chains,
                expansions = self.expansions,
                "candidate enumeration truncated"
            );
        }
        debug!(target = %target, candidates = chains.len(), "planned candidate chains");
        Plan {
            chains,
            unsatisfiable: Vec::new(),
            truncated,
        }
    }

    fn derivable(&self, key: &ArgKey) -> bool {
        self.base.contains(key) || self.witnesses.contains_key(key)
    }

    /// Collect the leaves and cycles that keep `goal` from being derived.
    fn diagnose(&self, goal: &ArgKey) -> Unsatisfiable {
        let mut diagnosis = Diagnosis::default();
        self.trace_missing(goal, &mut diagnosis);
        Unsatisfiable {
            key: goal.clone(),
            unresolved: diagnosis.unresolved.into_iter().collect(),
            cycles: diagnosis.cycles.into_iter().collect(),
        }
    }

    fn trace_missing(&self, key: &ArgKey, diagnosis: &mut Diagnosis) {
        if self.derivable(key) || diagnosis.done.contains(key) {
            return;
        }
        if diagnosis.path.contains(key) {
            diagnosis.cycles.insert(key.clone());
            return;
        }
        let Some(producers) = self.producers.get(key) else {
            diagnosis.unresolved.insert(key.clone());
            return;
        };
        diagnosis.path.push(key.clone());
        for id in producers {
            for input in self.converters[id.0].inputs() {
                self.trace_missing(input, diagnosis);
            }
        }
        diagnosis.path.pop();
        diagnosis.done.insert(key.clone());
    }

    /// Derive `goal`. Returns the derivation and the set of ancestor keys at
    /// which a cycle cut the search below this goal.
    fn derive(&mut self, goal: &ArgKey) -> (Rc<Derivation>, BTreeSet<ArgKey>) {
        if self.base.contains(goal) {
            return (Rc::new(Derivation::present()), BTreeSet::new());
        }
        if !self.derivable(goal) {
            return (Rc::new(Derivation::default()), BTreeSet::new());
        }

        if let Some(memoized) = self.memo.get(goal) {
            trace!(goal = %goal, "memoized goal");
            return (Rc::clone(memoized), BTreeSet::new());
        }

        if self.visiting.contains(goal) {
            trace!(goal = %goal, "cycle detected, cutting branch");
            return (
                Rc::new(Derivation::default()),
                BTreeSet::from([goal.clone()]),
            );
        }

        let visiting = &self.visiting;
        let reusable = self.cut_memo.get(goal).and_then(|entries| {
            entries
                .iter()
                .find(|(cuts, _)| cuts.iter().all(|k| visiting.contains(k)))
        });
        if let Some((cuts, memoized)) = reusable {
            trace!(goal = %goal, cuts = cuts.len(), "memoized goal under cycle cuts");
            return (Rc::clone(memoized), cuts.clone());
        }

        if self.expansions >= self.max_expansions {
            trace!(goal = %goal, "expansion bound reached, using forward derivation");
            let mut steps = Vec::new();
            self.witness(goal, &mut steps);
            let derivation = Derivation {
                alternatives: vec![Chain::new(steps)],
                truncated: true,
            };
            return (Rc::new(derivation), BTreeSet::new());
        }
        self.expansions += 1;

        let candidates = self.producers.get(goal).cloned().unwrap_or_default();
        let converters = self.converters;
        let mut per_producer: Vec<Vec<Chain>> = Vec::with_capacity(candidates.len());
        let mut truncated = false;
        let mut cuts = BTreeSet::new();

        self.visiting.push(goal.clone());
        for id in candidates {
            let mut inputs: Vec<&ArgKey> = converters[id.0].inputs().iter().collect();
            inputs.sort();
            if !inputs.iter().all(|k| self.derivable(k)) {
                continue;
            }

            let mut subs = Vec::with_capacity(inputs.len());
            let mut feasible = true;
            for input in inputs {
                let (sub, sub_cuts) = self.derive(input);
                cuts.extend(sub_cuts);
                if sub.alternatives.is_empty() {
                    feasible = false;
                    break;
                }
                subs.push(sub);
            }
            if !feasible {
                continue;
            }

            let groups: Vec<&[Chain]> = subs.iter().map(|s| s.alternatives.as_slice()).collect();
            let (partials, cut_short) = self.product(&groups);
            truncated |= cut_short || subs.iter().any(|s| s.truncated);
            per_producer.push(
                partials
                    .into_iter()
                    .filter(|partial| !partial.contains(id))
                    .map(|mut partial| {
                        partial.steps.push(id);
                        partial
                    })
                    .collect(),
            );
        }
        self.visiting.pop();

        let (alternatives, cut_short) = self.interleave(per_producer);
        let derivation = Rc::new(Derivation {
            alternatives,
            truncated: truncated || cut_short,
        });

        cuts.remove(goal);
        if cuts.is_empty() {
            self.memo.insert(goal.clone(), Rc::clone(&derivation));
        } else {
            self.cut_memo
                .entry(goal.clone())
                .or_default()
                .push((cuts.clone(), Rc::clone(&derivation)));
        }
        trace!(
            goal = %goal,
            alternatives = derivation.alternatives.len(),
            "derived goal"
        );
        (derivation, cuts)
    }

    /// Append the forward pass's derivation of `key` to `steps`.
    fn witness(&self, key: &ArgKey, steps: &mut Vec<ConverterId>) {
        if self.base.contains(key) {
            return;
        }
        let Some(&id) = self.witnesses.get(key) else {
            return;
        };
        if steps.contains(&id) {
            return;
        }
        for input in self.converters[id.0].inputs() {
            self.witness(input, steps);
        }
        steps.push(id);
    }

    /// Merge one alternative from every group, bounded by `max_chains`.
    ///
    /// The first chain takes the first alternative of every group. Then each
    /// group in turn varies alone over its remaining alternatives, and only
    /// after that come the other combinations, in lexicographic order. The
    /// flag is set when the bound dropped combinations.
    fn product(&self, groups: &[&[Chain]]) -> (Vec<Chain>, bool) {
        if groups.iter().any(|g| g.is_empty()) {
            return (Vec::new(), false);
        }
        let merge = |picks: &[usize]| {
            groups
                .iter()
                .zip(picks)
                .fold(Chain::default(), |acc, (group, &i)| acc.merged(&group[i]))
        };

        let mut picks = vec![0; groups.len()];
        let mut out = vec![merge(&picks)];
        for (g, group) in groups.iter().enumerate() {
            for i in 1..group.len() {
                if out.len() >= self.max_chains {
                    return (out, true);
                }
                picks[g] = i;
                out.push(merge(&picks));
            }
            picks[g] = 0;
        }

        loop {
            let mut pos = groups.len();
            loop {
                if pos == 0 {
                    return (out, false);
                }
                pos -= 1;
                picks[pos] += 1;
                if picks[pos] < groups[pos].len() {
                    break;
                }
                picks[pos] = 0;
            }
            if picks.iter().filter(|&&i| i > 0).count() <= 1 {
                continue;
            }
            if out.len() >= self.max_chains {
                return (out, true);
            }
            out.push(merge(&picks));
        }
    }

    /// Take alternatives round-robin across producers, skipping duplicates,
    /// bounded by `max_chains`.
    fn interleave(&self, per_producer: Vec<Vec<Chain>>) -> (Vec<Chain>, bool) {
        let rounds = per_producer.iter().map(Vec::len).max().unwrap_or(0);
        let mut out: Vec<Chain> = Vec::new();
        for round in 0..rounds {
            for chains in &per_producer {
                let Some(chain) = chains.get(round) else {
                    continue;
                };
                if out.contains(chain) {
                    continue;
                }
                if out.len() >= self.max_chains {
                    return (out, true);
                }
                out.push(chain.clone());
            }
        }
        (out, false)
    }

    /// Drop steps that cannot matter: steps whose outputs are all already
    /// available when they would run, then steps whose outputs nothing later
    /// in the chain (or the target) consumes.
    fn normalize(&self, chain: Chain, target: &Target) -> Chain {
        let mut available: BTreeSet<&ArgKey> = self.base.keys().collect();
        let mut forward = Vec::with_capacity(chain.len());
        for id in chain.steps {
            let outputs = self.converters[id.0].outputs();
            if outputs.iter().all(|k| available.contains(k)) {
                continue;
            }
            available.extend(outputs.iter());
            forward.push(id);
        }

        let mut needed: BTreeSet<&ArgKey> = target
            .required()
            .iter()
            .filter(|k| !self.base.contains(k))
            .collect();
        let mut kept = Vec::with_capacity(forward.len());
        for id in forward.into_iter().rev() {
            let converter = &self.converters[id.0];
            if converter.outputs().iter().any(|k| needed.contains(k)) {
                for key in converter.outputs() {
                    needed.remove(key);
                }
                needed.extend(
                    converter
                        .inputs()
                        .iter()
                        .filter(|k| !self.base.contains(k)),
                );
                kept.push(id);
            }
        }
        kept.reverse();
        Chain::new(kept)
    }
}

/// Fire every converter whose inputs are available, starting from `base`,
/// until nothing new becomes available. Returns the first producer of each
/// key reached.
fn forward_pass<'a>(
    converters: &'a [Converter],
    base: &Environment,
) -> HashMap<&'a ArgKey, ConverterId> {
    let mut witnesses: HashMap<&'a ArgKey, ConverterId> = HashMap::new();
    let mut pending: Vec<ConverterId> = (0..converters.len()).map(ConverterId).collect();
    loop {
        let before = pending.len();
        pending.retain(|&id| {
            let converter = &converters[id.0];
            let ready = converter
                .inputs()
                .iter()
                .all(|k| base.contains(k) || witnesses.contains_key(k));
            if ready {
                for key in converter.outputs() {
                    if !base.contains(key) {
                        witnesses.entry(key).or_insert(id);
                    }
                }
            }
            !ready
        });
        if pending.len() == before {
            return witnesses;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::Invocation;
    use crate::signature::{Shape, Signature};
    use std::time::{Duration, Instant};

    fn key(name: &'static str) -> ArgKey {
        ArgKey::of::<String>(name)
    }

    fn conv(name: &str, inputs: &[&'static str], outputs: &[&'static str]) -> Converter {
        let sig = Signature::function(
            vec![Shape::Struct(inputs.iter().map(|n| key(*n)).collect())],
            vec![Shape::Struct(outputs.iter().map(|n| key(*n)).collect())],
        );
        Converter::from_signature(name, &sig, |_env: Environment| Invocation::Absent).unwrap()
    }

    fn base(names: &[&'static str]) -> Environment {
        let mut env = Environment::new();
        for n in names {
            env.set(*n, n.to_string());
        }
        env
    }

    fn target(names: &[&'static str]) -> Target {
        Target::new(names.iter().map(|n| key(*n)))
    }

    fn ids(chain: &Chain) -> Vec<usize> {
        chain.steps().iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_satisfied_by_base_plans_empty_chain() {
        let convs = vec![conv("a_to_b", &["A"], &["B"])];
        let env = base(&["B"]);
        let plan = Planner::new(&convs, &env, 64).plan(&target(&["B"]));
        assert!(plan.is_feasible());
        assert_eq!(plan.chains, vec![Chain::default()]);
    }

    #[test]
    fn test_single_step() {
        let convs = vec![conv("full_to_name", &["FullName"], &["Name"])];
        let env = base(&["FullName"]);
        let plan = Planner::new(&convs, &env, 64).plan(&target(&["Name"]));
        assert_eq!(plan.chains.len(), 1);
        assert_eq!(ids(&plan.chains[0]), vec![0]);
        assert!(!plan.truncated);
    }

    #[test]
    fn test_alternatives_in_registration_order() {
        let convs = vec![
            conv("from_file", &["ConfigFile"], &["Port"]),
            conv("from_env", &["EnvVar"], &["Port"]),
        ];
        let env = base(&["ConfigFile", "EnvVar"]);
        let plan = Planner::new(&convs, &env, 64).plan(&target(&["Port"]));
        let chains: Vec<_> = plan.chains.iter().map(ids).collect();
        assert_eq!(chains, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_multi_step_topological_order() {
        let convs = vec![
            conv("b_to_c", &["B"], &["C"]),
            conv("a_to_b", &["A"], &["B"]),
        ];
        let env = base(&["A"]);
        let plan = Planner::new(&convs, &env, 64).plan(&target(&["C"]));
        assert_eq!(plan.chains.len(), 1);
        assert_eq!(ids(&plan.chains[0]), vec![1, 0]);
    }

    #[test]
    fn test_infeasible_branch_is_pruned() {
        let convs = vec![
            conv("from_missing", &["Nope"], &["Port"]),
            conv("from_env", &["EnvVar"], &["Port"]),
        ];
        let env = base(&["EnvVar"]);
        let plan = Planner::new(&convs, &env, 64).plan(&target(&["Port"]));
        let chains: Vec<_> = plan.chains.iter().map(ids).collect();
        assert_eq!(chains, vec![vec![1]]);
    }

    #[test]
    fn test_missing_input_reports_leaf() {
        let convs = vec![conv("url_to_db", &["DatabaseUrl"], &["DB"])];
        let env = Environment::new();
        let plan = Planner::new(&convs, &env, 64).plan(&target(&["DB"]));
        assert!(!plan.is_feasible());
        assert!(plan.chains.is_empty());
        assert_eq!(plan.unsatisfiable.len(), 1);
        assert_eq!(plan.unsatisfiable[0].key, key("DB"));
        assert_eq!(plan.unsatisfiable[0].unresolved, vec![key("DatabaseUrl")]);
    }

    #[test]
    fn test_cycle_terminates() {
        let convs = vec![conv("a_to_b", &["A"], &["B"]), conv("b_to_a", &["B"], &["A"])];
        let env = Environment::new();
        let plan = Planner::new(&convs, &env, 64).plan(&target(&["A"]));
        assert!(plan.chains.is_empty());
        assert_eq!(plan.unsatisfiable[0].cycles, vec![key("A")]);
    }

    #[test]
    fn test_cycle_with_escape_hatch() {
        let convs = vec![
            conv("a_to_b", &["A"], &["B"]),
            conv("b_to_a", &["B"], &["A"]),
            conv("seed_to_a", &["Seed"], &["A"]),
        ];
        let env = base(&["Seed"]);
        let plan = Planner::new(&convs, &env, 64).plan(&target(&["B"]));
        let chains: Vec<_> = plan.chains.iter().map(ids).collect();
        assert_eq!(chains, vec![vec![2, 0]]);
    }

    #[test]
    fn test_shared_subgoal_runs_once() {
        let convs = vec![
            conv("raw_to_cfg", &["Raw"], &["Config"]),
            conv("cfg_to_host", &["Config"], &["Host"]),
            conv("cfg_to_port", &["Config"], &["Port"]),
        ];
        let env = base(&["Raw"]);
        let plan = Planner::new(&convs, &env, 64).plan(&target(&["Host", "Port"]));
        assert_eq!(plan.chains.len(), 1);
        assert_eq!(ids(&plan.chains[0]), vec![0, 1, 2]);
    }

    #[test]
    fn test_redundant_producer_is_dropped() {
        // Host picks cfg via raw_to_cfg, Port picks cfg via alt_cfg; the merged
        // chain only needs one Config producer.
        let convs = vec![
            conv("raw_to_cfg", &["Raw"], &["Config"]),
            conv("alt_cfg", &["Alt"], &["Config"]),
            conv("cfg_to_host", &["Config"], &["Host"]),
            conv("cfg_to_port", &["Config"], &["Port"]),
        ];
        let env = base(&["Raw", "Alt"]);
        let plan = Planner::new(&convs, &env, 64).plan(&target(&["Host", "Port"]));
        let chains: Vec<_> = plan.chains.iter().map(ids).collect();
        assert_eq!(chains, vec![vec![0, 2, 3], vec![1, 2, 3]]);
    }

    #[test]
    fn test_max_chains_bounds_enumeration() {
        let convs = vec![
            conv("p1", &["X"], &["Port"]),
            conv("p2", &["X"], &["Port"]),
            conv("p3", &["X"], &["Port"]),
        ];
        let env = base(&["X"]);
        let plan = Planner::new(&convs, &env, 2).plan(&target(&["Port"]));
        let chains: Vec<_> = plan.chains.iter().map(ids).collect();
        assert_eq!(chains, vec![vec![0], vec![1]]);
        assert!(plan.truncated);
    }

    #[test]
    fn test_every_alternative_planned_before_recombination() {
        let convs = vec![
            conv("a0", &["S"], &["A"]),
            conv("a1", &["S"], &["A"]),
            conv("a2", &["S"], &["A"]),
            conv("b0", &["S"], &["B"]),
            conv("b1", &["S"], &["B"]),
            conv("b2", &["S"], &["B"]),
        ];
        let env = base(&["S"]);
        let plan = Planner::new(&convs, &env, 5).plan(&target(&["A", "B"]));
        let chains: Vec<_> = plan.chains.iter().map(ids).collect();
        assert_eq!(
            chains,
            vec![vec![0, 3], vec![1, 3], vec![2, 3], vec![0, 4], vec![0, 5]]
        );
        assert!(plan.truncated);

        let plan = Planner::new(&convs, &env, 64).plan(&target(&["A", "B"]));
        assert_eq!(plan.chains.len(), 9);
        assert!(!plan.truncated);
    }

    #[test]
    fn test_wide_producer_does_not_hide_later_producer() {
        let convs = vec![
            conv("x0", &["S"], &["X"]),
            conv("x1", &["S"], &["X"]),
            conv("x2", &["S"], &["X"]),
            conv("via_x", &["X"], &["Port"]),
            conv("direct", &["S"], &["Port"]),
        ];
        let env = base(&["S"]);
        let plan = Planner::new(&convs, &env, 2).plan(&target(&["Port"]));
        let chains: Vec<_> = plan.chains.iter().map(ids).collect();
        assert_eq!(chains, vec![vec![0, 3], vec![4]]);
        assert!(plan.truncated);
    }

    fn numbered(i: usize) -> ArgKey {
        ArgKey::of::<u32>(format!("K{}", i))
    }

    /// One converter per ordered pair of `n` keys, preceded by `seeds`.
    fn complete_graph(n: usize, seeds: Vec<Converter>) -> Vec<Converter> {
        let mut convs = seeds;
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let sig = Signature::function(
                    vec![Shape::Struct(vec![numbered(i)])],
                    vec![Shape::Struct(vec![numbered(j)])],
                );
                let name = format!("K{}_to_K{}", i, j);
                convs.push(
                    Converter::from_signature(name, &sig, |_env: Environment| Invocation::Absent)
                        .unwrap(),
                );
            }
        }
        convs
    }

    #[test]
    fn test_dense_cycle_without_base_plans_quickly() {
        let convs = complete_graph(12, Vec::new());
        let env = Environment::new();
        let started = Instant::now();
        let plan = Planner::new(&convs, &env, 64).plan(&Target::new([numbered(0)]));
        let elapsed = started.elapsed();

        assert!(elapsed < Duration::from_secs(2), "planning took {:?}", elapsed);
        assert!(!plan.is_feasible());
        assert_eq!(plan.unsatisfiable[0].key, numbered(0));
        assert!(plan.unsatisfiable[0].cycles.contains(&numbered(0)));
        assert!(plan.unsatisfiable[0].unresolved.is_empty());
    }

    #[test]
    fn test_dense_cycle_with_seed_plans_quickly() {
        let n = 8;
        let sig = Signature::function(
            vec![Shape::Struct(vec![key("Seed")])],
            vec![Shape::Struct(vec![numbered(n - 1)])],
        );
        let seed =
            Converter::from_signature("seed", &sig, |_env: Environment| Invocation::Absent).unwrap();
        let convs = complete_graph(n, vec![seed]);
        let env = base(&["Seed"]);
        let last_to_first = convs
            .iter()
            .position(|c| c.name() == format!("K{}_to_K0", n - 1))
            .unwrap();

        let started = Instant::now();
        let plan = Planner::new(&convs, &env, 64).plan(&Target::new([numbered(0)]));
        let elapsed = started.elapsed();

        assert!(elapsed < Duration::from_secs(5), "planning took {:?}", elapsed);
        assert!(plan.is_feasible());
        assert!(plan.chains.len() <= 64);
        assert!(plan
            .chains
            .contains(&Chain::new(vec![ConverterId(0), ConverterId(last_to_first)])));
    }

    #[test]
    fn test_planning_is_deterministic() {
        let convs = vec![
            conv("raw_to_cfg", &["Raw"], &["Config"]),
            conv("alt_cfg", &["Alt"], &["Config"]),
            conv("cfg_to_host", &["Config"], &["Host"]),
            conv("env_to_host", &["Env"], &["Host"]),
        ];
        let env = base(&["Raw", "Alt", "Env"]);
        let first = Planner::new(&convs, &env, 64).plan(&target(&["Host"]));
        let second = Planner::new(&convs, &env, 64).plan(&target(&["Host"]));
        assert_eq!(first.chains, second.chains);
        assert_eq!(first.chains.len(), 3);
    }
}
