//! Cross-tool grouping via a typestate merge builder.
//!
//! A merge passes through three states: `Collecting` (issues are being
//! gathered from results), `Keyed` (every issue has a correlation key but no
//! group membership), and `Grouped` (groups are closed and membership is
//! frozen). Only the terminal state hands out groups.

use std::marker::PhantomData;

use skyline_core::model::{IssueGroup, SearchRadius, UnifiedResult};
use skyline_core::taxonomy::{AnalysisCategory, Severity};
use skyline_core::{FxHashMap, FxHashSet};

/// A flattened view of one issue, carrying everything grouping needs.
#[derive(Debug, Clone)]
pub(crate) struct IssueRef {
    pub id: String,
    pub key: String,
    pub canonical_path: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub category: AnalysisCategory,
    pub tool: String,
    pub severity: Severity,
    pub patterns: Vec<String>,
    pub radius: SearchRadius,
}

pub struct Collecting;
pub struct Keyed;
pub struct Grouped;

/// Typestate merge builder. State transitions consume the builder, so a
/// caller cannot read groups before grouping has run or add issues after.
pub struct MergeBuilder<S> {
    refs: Vec<IssueRef>,
    groups: Vec<IssueGroup>,
    ungrouped: Vec<String>,
    _state: PhantomData<S>,
}

impl MergeBuilder<Collecting> {
    pub fn new() -> Self {
        Self {
            refs: Vec::new(),
            groups: Vec::new(),
            ungrouped: Vec::new(),
            _state: PhantomData,
        }
    }

    /// Flatten one result's issues. Entity-id collisions are tolerated here;
    /// grouping compares canonical paths by value, never entity ids, so two
    /// colliding entities are never silently merged.
    pub fn add_result(&mut self, result: &UnifiedResult) {
        let mut path_of: FxHashMap<&str, &str> = FxHashMap::default();
        for entity in &result.entities {
            path_of
                .entry(entity.id.as_str())
                .or_insert(entity.canonical_path.as_str());
        }

        for issue in &result.issues {
            let canonical_path = match path_of.get(issue.entity_id.as_str()) {
                Some(p) => (*p).to_string(),
                None => {
                    tracing::warn!(issue = %issue.id, "issue without entity skipped in merge");
                    continue;
                }
            };
            self.refs.push(IssueRef {
                id: issue.id.clone(),
                key: issue.correlation_key.clone(),
                canonical_path,
                line: issue.location.map(|l| l.line),
                column: issue.location.map(|l| l.column),
                category: issue.category,
                tool: issue.tool.clone(),
                severity: issue.severity,
                patterns: issue.hints.cross_tool_patterns.iter().cloned().collect(),
                radius: issue.hints.search_radius,
            });
        }
    }

    /// Freeze the collection. Every collected issue already carries its
    /// correlation key; this transition fixes a deterministic order.
    pub fn keyed(mut self) -> MergeBuilder<Keyed> {
        self.refs
            .sort_by(|a, b| (&a.key, &a.id).cmp(&(&b.key, &b.id)));
        MergeBuilder {
            refs: self.refs,
            groups: self.groups,
            ungrouped: self.ungrouped,
            _state: PhantomData,
        }
    }
}

impl Default for MergeBuilder<Collecting> {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeBuilder<Keyed> {
    /// Close groups. Two issues correlate when their canonical paths are
    /// equal, their lines and columns fall within both issues' search radii,
    /// and their cross-tool pattern sets intersect. Connected components of
    /// size two or more become groups.
    pub fn grouped(mut self) -> MergeBuilder<Grouped> {
        let n = self.refs.len();
        let mut dsu = Dsu::new(n);

        // Bucket by path so the pairwise scan stays local.
        let mut by_path: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
        for (i, r) in self.refs.iter().enumerate() {
            by_path.entry(r.canonical_path.as_str()).or_default().push(i);
        }

        for indices in by_path.values() {
            for (pos, &i) in indices.iter().enumerate() {
                for &j in &indices[pos + 1..] {
                    if correlates(&self.refs[i], &self.refs[j]) {
                        dsu.union(i, j);
                    }
                }
            }
        }

        let mut components: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
        for i in 0..n {
            components.entry(dsu.find(i)).or_default().push(i);
        }

        let mut groups = Vec::new();
        let mut ungrouped = Vec::new();
        for members in components.into_values() {
            if members.len() < 2 {
                ungrouped.push(self.refs[members[0]].id.clone());
                continue;
            }
            groups.push(close_group(&self.refs, &members));
        }

        groups.sort_by(|a, b| a.key.cmp(&b.key));
        ungrouped.sort();

        self.groups = groups;
        self.ungrouped = ungrouped;
        MergeBuilder {
            refs: self.refs,
            groups: self.groups,
            ungrouped: self.ungrouped,
            _state: PhantomData,
        }
    }
}

impl MergeBuilder<Grouped> {
    pub fn groups(&self) -> &[IssueGroup] {
        &self.groups
    }

    pub fn ungrouped_ids(&self) -> &[String] {
        &self.ungrouped
    }

    pub(crate) fn into_parts(self) -> (Vec<IssueGroup>, Vec<String>, Vec<IssueRef>) {
        (self.groups, self.ungrouped, self.refs)
    }
}

/// The pairwise correlation predicate. Missing lines and columns compare
/// as zero so non-source findings on the same path can still group.
fn correlates(a: &IssueRef, b: &IssueRef) -> bool {
    let line_radius = a.radius.lines.min(b.radius.lines);
    let col_radius = a.radius.columns.min(b.radius.columns);

    let la = a.line.unwrap_or(0);
    let lb = b.line.unwrap_or(0);
    if la.abs_diff(lb) > line_radius {
        return false;
    }

    let ca = a.column.unwrap_or(0);
    let cb = b.column.unwrap_or(0);
    if ca.abs_diff(cb) > col_radius {
        return false;
    }

    a.patterns.iter().any(|p| b.patterns.contains(p))
}

fn close_group(refs: &[IssueRef], members: &[usize]) -> IssueGroup {
    let mut issue_ids: Vec<String> = members.iter().map(|&i| refs[i].id.clone()).collect();
    issue_ids.sort();

    let key = members
        .iter()
        .map(|&i| refs[i].key.as_str())
        .min()
        .unwrap_or("")
        .to_string();

    let mut tools: Vec<String> = members
        .iter()
        .map(|&i| refs[i].tool.clone())
        .collect::<FxHashSet<_>>()
        .into_iter()
        .collect();
    tools.sort();

    let mut shared: FxHashSet<&str> = refs[members[0]]
        .patterns
        .iter()
        .map(|s| s.as_str())
        .collect();
    for &i in &members[1..] {
        let here: FxHashSet<&str> = refs[i].patterns.iter().map(|s| s.as_str()).collect();
        shared.retain(|p| here.contains(p));
    }
    let mut shared_patterns: Vec<String> = shared.into_iter().map(|s| s.to_string()).collect();
    shared_patterns.sort();

    let max_severity = members
        .iter()
        .map(|&i| refs[i].severity)
        .max()
        .unwrap_or(Severity::Info);

    IssueGroup {
        key,
        canonical_path: refs[members[0]].canonical_path.clone(),
        issue_ids,
        tools,
        shared_patterns,
        max_severity,
    }
}

/// Disjoint-set union with path halving.
struct Dsu {
    parent: Vec<usize>,
}

impl Dsu {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Smaller root wins to keep results order-independent.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}
