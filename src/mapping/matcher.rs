/// Shape matching: pairs columns with target members
///
/// One side is indexed by candidate name, the other side probes the index:
/// - destination-driven: index columns, iterate members (row → object)
/// - source-driven: index members, iterate columns (object → parameter list)
///
/// Both produce (member, column) pairs and share the same rules:
/// - candidate lookup is case-insensitive
/// - among indexed items sharing a candidate, the longest original name wins
/// - the first probe candidate with a live indexed item decides; an
///   incompatible type there means "not found"
/// - every item is consumed at most once
/// - whatever stays unpaired is reported to the diagnostics sink
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::mapping::candidates::candidates_with_prefix;
use crate::mapping::compat::is_compatible;
use crate::metadata::column::{Column, TypeTag};
use crate::metadata::member::Member;
use std::collections::HashMap;

/// Direction values flow through a pairing (drives the compatibility check)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Column values are stored into members
    ColumnToMember,
    /// Member values are sent out as column/parameter values
    MemberToColumn,
}

#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// Removable prefix on column names
    pub column_prefix: Option<String>,
    /// Removable prefix on member names (usually the target type's name)
    pub member_prefix: Option<String>,
    pub flow: Flow,
    pub report_unmapped_members: bool,
    pub report_unmapped_columns: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            column_prefix: None,
            member_prefix: None,
            flow: Flow::ColumnToMember,
            report_unmapped_members: true,
            report_unmapped_columns: true,
        }
    }
}

/// A member index paired with a column index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedPair {
    pub member: usize,
    pub column: usize,
}

/// Ordered pairs plus what stayed unpaired
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingPlan {
    pairs: Vec<MappedPair>,
    unmapped_members: Vec<usize>,
    unmapped_columns: Vec<usize>,
}

impl MappingPlan {
    pub fn pairs(&self) -> &[MappedPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn unmapped_members(&self) -> &[usize] {
        &self.unmapped_members
    }

    pub fn unmapped_columns(&self) -> &[usize] {
        &self.unmapped_columns
    }

    /// Column paired with `member`, if any
    pub fn column_for(&self, member: usize) -> Option<usize> {
        self.pairs.iter().find(|p| p.member == member).map(|p| p.column)
    }
}

/// Case-insensitive candidate name → indexed item positions, longest original name first
struct CandidateIndex {
    entries: HashMap<String, Vec<usize>>,
}

impl CandidateIndex {
    fn build(candidates: &[Vec<String>], name_lengths: &[usize]) -> Self {
        let mut entries: HashMap<String, Vec<usize>> = HashMap::new();
        for (item, names) in candidates.iter().enumerate() {
            for name in names {
                let slot = entries.entry(name.to_ascii_lowercase()).or_default();
                if !slot.contains(&item) {
                    slot.push(item);
                }
            }
        }
        // Stable: equal lengths keep ordinal order
        for slot in entries.values_mut() {
            slot.sort_by(|a, b| name_lengths[*b].cmp(&name_lengths[*a]));
        }
        Self { entries }
    }

    /// First live item registered under the first candidate that has one
    fn probe(&self, candidates: &[String], consumed: &[bool]) -> Option<usize> {
        candidates.iter().find_map(|name| {
            self.entries
                .get(&name.to_ascii_lowercase())
                .and_then(|slot| slot.iter().copied().find(|&item| !consumed[item]))
        })
    }
}

struct Outcome {
    /// (probe item, indexed item)
    pairs: Vec<(usize, usize)>,
    /// probe item, plus the indexed item it hit if the type was incompatible
    unmatched_probe: Vec<(usize, Option<usize>)>,
    consumed: Vec<bool>,
}

fn run(
    probe: &[Vec<String>],
    indexed: &[Vec<String>],
    indexed_name_lengths: &[usize],
    compatible: impl Fn(usize, usize) -> bool,
) -> Outcome {
    let index = CandidateIndex::build(indexed, indexed_name_lengths);
    let mut consumed = vec![false; indexed.len()];
    let mut pairs = Vec::new();
    let mut unmatched_probe = Vec::new();

    for (item, candidates) in probe.iter().enumerate() {
        match index.probe(candidates, &consumed) {
            Some(hit) if compatible(item, hit) => {
                consumed[hit] = true;
                pairs.push((item, hit));
            }
            Some(hit) => unmatched_probe.push((item, Some(hit))),
            None => unmatched_probe.push((item, None)),
        }
    }

    Outcome {
        pairs,
        unmatched_probe,
        consumed,
    }
}

fn column_candidates(columns: &[Column], options: &MatchOptions) -> Vec<Vec<String>> {
    columns
        .iter()
        .map(|c| candidates_with_prefix(&c.name, c.type_tag, options.column_prefix.as_deref()))
        .collect()
}

fn member_candidates(members: &[Member], options: &MatchOptions) -> Vec<Vec<String>> {
    members
        .iter()
        .map(|m| candidates_with_prefix(&m.name, m.type_tag, options.member_prefix.as_deref()))
        .collect()
}

fn pair_compatible(flow: Flow, member: &Member, column: &Column) -> bool {
    match flow {
        Flow::ColumnToMember => is_compatible(column.type_tag, member.type_tag),
        Flow::MemberToColumn => is_compatible(member.type_tag, column.type_tag),
    }
}

/// Enumerate members in declaration order and find each one's best column
pub fn match_destination(
    target: &str,
    columns: &[Column],
    members: &[Member],
    options: &MatchOptions,
    sink: &dyn DiagnosticSink,
) -> MappingPlan {
    let lengths: Vec<usize> = columns.iter().map(|c| c.name.len()).collect();
    let outcome = run(
        &member_candidates(members, options),
        &column_candidates(columns, options),
        &lengths,
        |m, c| pair_compatible(options.flow, &members[m], &columns[c]),
    );

    let plan = MappingPlan {
        pairs: outcome
            .pairs
            .iter()
            .map(|&(member, column)| MappedPair { member, column })
            .collect(),
        unmapped_members: outcome.unmatched_probe.iter().map(|&(m, _)| m).collect(),
        unmapped_columns: unconsumed(&outcome.consumed),
    };

    let incompatible: HashMap<usize, usize> = outcome
        .unmatched_probe
        .iter()
        .filter_map(|&(m, hit)| hit.map(|c| (m, c)))
        .collect();
    report(target, columns, members, &plan, options, sink, |m| {
        incompatible.get(&m).map(|&c| columns[c].name.clone())
    }, |_| None);

    plan
}

/// Enumerate columns in ordinal order and find each one's best member
pub fn match_source(
    target: &str,
    columns: &[Column],
    members: &[Member],
    options: &MatchOptions,
    sink: &dyn DiagnosticSink,
) -> MappingPlan {
    let lengths: Vec<usize> = members.iter().map(|m| m.name.len()).collect();
    let outcome = run(
        &column_candidates(columns, options),
        &member_candidates(members, options),
        &lengths,
        |c, m| pair_compatible(options.flow, &members[m], &columns[c]),
    );

    let plan = MappingPlan {
        pairs: outcome
            .pairs
            .iter()
            .map(|&(column, member)| MappedPair { member, column })
            .collect(),
        unmapped_members: unconsumed(&outcome.consumed),
        unmapped_columns: outcome.unmatched_probe.iter().map(|&(c, _)| c).collect(),
    };

    let incompatible: HashMap<usize, usize> = outcome
        .unmatched_probe
        .iter()
        .filter_map(|&(c, hit)| hit.map(|m| (c, m)))
        .collect();
    report(target, columns, members, &plan, options, sink, |_| None, |c| {
        incompatible.get(&c).map(|&m| members[m].name.clone())
    });

    plan
}

fn unconsumed(consumed: &[bool]) -> Vec<usize> {
    consumed
        .iter()
        .enumerate()
        .filter(|(_, used)| !**used)
        .map(|(i, _)| i)
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn report(
    target: &str,
    columns: &[Column],
    members: &[Member],
    plan: &MappingPlan,
    options: &MatchOptions,
    sink: &dyn DiagnosticSink,
    member_conflict: impl Fn(usize) -> Option<String>,
    column_conflict: impl Fn(usize) -> Option<String>,
) {
    let emit = |kind: DiagnosticKind, name: &str, type_tag: TypeTag, prefix: Option<&String>, conflict| {
        sink.emit(&Diagnostic {
            kind,
            target: target.to_string(),
            name: name.to_string(),
            type_tag,
            prefix: prefix.cloned(),
            incompatible_with: conflict,
        });
    };

    if options.report_unmapped_members {
        for &m in &plan.unmapped_members {
            let member = &members[m];
            emit(
                DiagnosticKind::UnmappedMember,
                &member.name,
                member.type_tag,
                options.member_prefix.as_ref(),
                member_conflict(m),
            );
        }
    }
    if options.report_unmapped_columns {
        for &c in &plan.unmapped_columns {
            let column = &columns[c];
            emit(
                DiagnosticKind::UnmappedColumn,
                &column.name,
                column.type_tag,
                options.column_prefix.as_ref(),
                column_conflict(c),
            );
        }
    }
}
