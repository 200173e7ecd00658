use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::error::Warning;
use crate::ir::{Category, Graph};

#[derive(Debug, Clone, Default)]
pub(super) struct LevelAssignment {
    /// Level of every connected node.
    pub(super) levels: BTreeMap<String, usize>,
    /// Entry points in traversal order, synthetic ones last.
    pub(super) entries: Vec<String>,
    /// Traversal tree: child -> parent.
    pub(super) parents: HashMap<String, String>,
}

/// Breadth-first levels from the entry points. Connected nodes no entry
/// reaches are seeded one at a time from the unreached node with the highest
/// out-degree, which keeps every cycle terminating.
pub(super) fn assign_levels(graph: &Graph, warnings: &mut Vec<Warning>) -> LevelAssignment {
    let in_degrees = graph.in_degrees();
    let out_degrees = graph.out_degrees();
    let isolated = graph.isolated_nodes();

    let connected: Vec<&str> = graph
        .nodes
        .keys()
        .map(String::as_str)
        .filter(|id| !isolated.contains(id))
        .collect();

    let mut assignment = LevelAssignment::default();
    for id in &connected {
        let indeg = in_degrees.get(id).copied().unwrap_or(0);
        let outdeg = out_degrees.get(id).copied().unwrap_or(0);
        let declared_entry = graph
            .nodes
            .get(*id)
            .is_some_and(|node| node.category == Category::Entry);
        if (indeg == 0 && outdeg > 0) || declared_entry {
            assignment.entries.push((*id).to_string());
        }
    }
    let seeds = assignment.entries.clone();
    bfs_from(graph, &seeds, &mut assignment);

    loop {
        let unreached: Vec<&str> = connected
            .iter()
            .copied()
            .filter(|id| !assignment.levels.contains_key(*id))
            .collect();
        let Some(entry) = unreached
            .iter()
            .copied()
            .max_by(|a, b| {
                let da = out_degrees.get(a).copied().unwrap_or(0);
                let db = out_degrees.get(b).copied().unwrap_or(0);
                // Highest out-degree first, then the smallest identity.
                da.cmp(&db).then_with(|| b.cmp(a))
            })
        else {
            break;
        };
        Warning::CyclicNoEntry {
            entry: entry.to_string(),
            out_degree: out_degrees.get(entry).copied().unwrap_or(0),
            unreached: unreached.len(),
        }
        .emit(warnings);
        assignment.entries.push(entry.to_string());
        bfs_from(graph, &[entry.to_string()], &mut assignment);
    }

    assignment
}

fn bfs_from(graph: &Graph, seeds: &[String], assignment: &mut LevelAssignment) {
    let mut queue: VecDeque<String> = VecDeque::new();
    for seed in seeds {
        if !assignment.levels.contains_key(seed) {
            assignment.levels.insert(seed.clone(), 0);
            queue.push_back(seed.clone());
        }
    }
    while let Some(id) = queue.pop_front() {
        let level = assignment.levels.get(&id).copied().unwrap_or(0);
        for next in graph.successors(&id) {
            if assignment.levels.contains_key(next) {
                continue;
            }
            assignment.levels.insert(next.to_string(), level + 1);
            assignment.parents.insert(next.to_string(), id.clone());
            queue.push_back(next.to_string());
        }
    }
}

/// Edges of the deepest traversal-tree path, the backbone drawn as the main
/// execution path.
pub(super) fn spine_edges(assignment: &LevelAssignment) -> HashSet<(String, String)> {
    let mut spine = HashSet::new();
    let deepest = assignment
        .levels
        .iter()
        .max_by(|(a_id, a_level), (b_id, b_level)| a_level.cmp(b_level).then_with(|| b_id.cmp(a_id)));
    let Some((mut current, _)) = deepest else {
        return spine;
    };
    while let Some(parent) = assignment.parents.get(current) {
        spine.insert((parent.clone(), current.clone()));
        current = parent;
    }
    spine
}

/// Group connected nodes by level and order each level with barycenter
/// sweeps. The starting order is role order then identity.
pub(super) fn order_levels(
    graph: &Graph,
    levels: &BTreeMap<String, usize>,
    passes: usize,
) -> Vec<Vec<String>> {
    let depth = levels.values().copied().max().map_or(0, |max| max + 1);
    let mut buckets: Vec<Vec<String>> = vec![Vec::new(); depth];
    for (id, level) in levels {
        buckets[*level].push(id.clone());
    }
    let sort_key = |id: &str| {
        let order = graph
            .nodes
            .get(id)
            .map_or(u8::MAX, |node| node.category.sequence_order());
        (order, id.to_string())
    };
    for bucket in &mut buckets {
        bucket.sort_by_key(|id| sort_key(id.as_str()));
    }
    order_rank_nodes(&mut buckets, graph, levels, &sort_key, passes);
    if tracing::enabled!(tracing::Level::DEBUG) {
        tracing::debug!(
            levels = buckets.len(),
            crossings = count_crossings(graph, &buckets),
            "levels ordered"
        );
    }
    buckets
}

fn order_rank_nodes(
    rank_nodes: &mut [Vec<String>],
    graph: &Graph,
    levels: &BTreeMap<String, usize>,
    sort_key: &dyn Fn(&str) -> (u8, String),
    passes: usize,
) {
    if rank_nodes.len() <= 1 {
        return;
    }
    // Only edges between adjacent levels pull on the ordering.
    let mut incoming: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for (from, to) in graph.edges.keys() {
        let (Some(lf), Some(lt)) = (levels.get(from), levels.get(to)) else {
            continue;
        };
        if *lt == lf + 1 {
            outgoing.entry(from.as_str()).or_default().push(to.as_str());
            incoming.entry(to.as_str()).or_default().push(from.as_str());
        }
    }

    let mut positions: HashMap<String, usize> = HashMap::new();
    let update_positions = |rank_nodes: &[Vec<String>], positions: &mut HashMap<String, usize>| {
        positions.clear();
        for bucket in rank_nodes {
            for (idx, id) in bucket.iter().enumerate() {
                positions.insert(id.clone(), idx);
            }
        }
    };
    update_positions(rank_nodes, &mut positions);

    let sort_bucket = |bucket: &mut Vec<String>,
                       neighbors: &HashMap<&str, Vec<&str>>,
                       positions: &HashMap<String, usize>| {
        let scores: HashMap<String, f32> = bucket
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), barycenter(id, idx, neighbors, positions)))
            .collect();
        bucket.sort_by(|a, b| {
            let sa = scores.get(a).copied().unwrap_or(0.0);
            let sb = scores.get(b).copied().unwrap_or(0.0);
            sa.partial_cmp(&sb)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| sort_key(a.as_str()).cmp(&sort_key(b.as_str())))
        });
    };

    for pass in 0..passes {
        let before: Vec<Vec<String>> = rank_nodes.to_vec();
        for rank in 1..rank_nodes.len() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &incoming, &positions);
            update_positions(rank_nodes, &mut positions);
        }
        for rank in (0..rank_nodes.len() - 1).rev() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &outgoing, &positions);
            update_positions(rank_nodes, &mut positions);
        }
        if before[..] == rank_nodes[..] {
            tracing::debug!(passes = pass + 1, "level ordering converged");
            return;
        }
    }
}

/// Mean position of the neighbours on the adjacent level; nodes without any
/// keep their current slot.
fn barycenter(
    id: &str,
    current: usize,
    neighbors: &HashMap<&str, Vec<&str>>,
    positions: &HashMap<String, usize>,
) -> f32 {
    let values: Vec<f32> = neighbors
        .get(id)
        .map(|list| {
            list.iter()
                .filter_map(|neighbor| positions.get(*neighbor))
                .map(|pos| *pos as f32)
                .collect()
        })
        .unwrap_or_default();
    if values.is_empty() {
        return current as f32;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Number of crossings between adjacent levels for the given order.
fn count_crossings(graph: &Graph, order: &[Vec<String>]) -> usize {
    let mut index: HashMap<&str, (usize, usize)> = HashMap::new();
    for (level, bucket) in order.iter().enumerate() {
        for (pos, id) in bucket.iter().enumerate() {
            index.insert(id.as_str(), (level, pos));
        }
    }
    let mut per_gap: BTreeMap<usize, Vec<(usize, usize)>> = BTreeMap::new();
    let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
    for (from, to) in graph.edges.keys() {
        let (Some(&(lf, pf)), Some(&(lt, pt))) = (index.get(from.as_str()), index.get(to.as_str()))
        else {
            continue;
        };
        if lt == lf + 1 && seen.insert((from.as_str(), to.as_str())) {
            per_gap.entry(lf).or_default().push((pf, pt));
        }
    }
    let mut crossings = 0;
    for segments in per_gap.values() {
        for (i, a) in segments.iter().enumerate() {
            for b in &segments[i + 1..] {
                if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                    crossings += 1;
                }
            }
        }
    }
    crossings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_nodes;

    fn graph(edges: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for (from, to) in edges {
            graph.add_call(from, to, 1);
        }
        classify_nodes(&mut graph);
        graph
    }

    #[test]
    fn levels_follow_shortest_distance() {
        let graph = graph(&[
            ("main", "init"),
            ("main", "process"),
            ("process", "helper"),
            ("helper", "main"),
        ]);
        let mut warnings = Vec::new();
        let assignment = assign_levels(&graph, &mut warnings);
        assert!(warnings.is_empty());
        assert_eq!(assignment.levels["main"], 0);
        assert_eq!(assignment.levels["init"], 1);
        assert_eq!(assignment.levels["process"], 1);
        assert_eq!(assignment.levels["helper"], 2);
        assert_eq!(assignment.entries, vec!["main"]);
    }

    #[test]
    fn pure_cycle_gets_synthetic_entry() {
        let graph = graph(&[("a", "b"), ("b", "c"), ("c", "a"), ("b", "d")]);
        let mut warnings = Vec::new();
        let assignment = assign_levels(&graph, &mut warnings);
        assert_eq!(assignment.entries, vec!["b"]);
        assert_eq!(assignment.levels["b"], 0);
        assert_eq!(assignment.levels["c"], 1);
        assert_eq!(assignment.levels["d"], 1);
        assert_eq!(assignment.levels["a"], 2);
        assert_eq!(
            warnings,
            vec![Warning::CyclicNoEntry {
                entry: "b".to_string(),
                out_degree: 2,
                unreached: 4,
            }]
        );
    }

    #[test]
    fn unreachable_cycle_beside_entry_is_still_levelled() {
        let graph = graph(&[("start", "x"), ("p", "q"), ("q", "p")]);
        let mut warnings = Vec::new();
        let assignment = assign_levels(&graph, &mut warnings);
        assert_eq!(assignment.levels.len(), 4);
        assert_eq!(assignment.levels["p"], 0);
        assert_eq!(assignment.levels["q"], 1);
        assert_eq!(warnings.len(), 1);
    }

    /// Every levelled node below level 0 has a caller exactly one level
    /// above it.
    fn assert_levels_have_parents(graph: &Graph) {
        let assignment = assign_levels(graph, &mut Vec::new());
        assert_eq!(
            assignment.levels.len(),
            graph.nodes.len() - graph.isolated_nodes().len()
        );
        for (id, level) in &assignment.levels {
            if *level == 0 {
                assert!(assignment.entries.contains(id), "{id} on level 0 is not an entry");
                continue;
            }
            let has_parent = graph.edges.keys().any(|(from, to)| {
                to == id && assignment.levels.get(from) == Some(&(level - 1))
            });
            assert!(has_parent, "{id} on level {level} has no caller one level up");
        }
    }

    #[test]
    fn levels_keep_a_caller_one_level_up() {
        let diamond = graph(&[
            ("main", "a"),
            ("main", "b"),
            ("a", "c"),
            ("b", "c"),
            ("c", "d"),
        ]);
        assert_levels_have_parents(&diamond);

        let shortcut = graph(&[
            ("main", "n1"),
            ("n1", "n2"),
            ("n2", "n3"),
            ("n3", "n4"),
            ("main", "n3"),
        ]);
        assert_levels_have_parents(&shortcut);
        let levels = assign_levels(&shortcut, &mut Vec::new()).levels;
        assert_eq!(levels["n3"], 1);
        assert_eq!(levels["n4"], 2);

        let joined_cycles = graph(&[
            ("p", "q"),
            ("q", "p"),
            ("q", "r"),
            ("r", "s"),
            ("s", "r"),
        ]);
        assert_levels_have_parents(&joined_cycles);

        let mut wide = Vec::new();
        let names: Vec<String> = (0..20).map(|i| format!("f{i:02}")).collect();
        wide.push(("main", names[0].as_str()));
        for i in 0..names.len() {
            wide.push((names[i].as_str(), names[(i * 7 + 3) % names.len()].as_str()));
            wide.push((names[i].as_str(), names[(i + 1) % names.len()].as_str()));
        }
        assert_levels_have_parents(&graph(&wide));
    }

    #[test]
    fn spine_follows_deepest_path() {
        let graph = graph(&[("main", "a"), ("main", "b"), ("b", "c"), ("c", "d")]);
        let assignment = assign_levels(&graph, &mut Vec::new());
        let spine = spine_edges(&assignment);
        assert_eq!(spine.len(), 3);
        assert!(spine.contains(&("c".to_string(), "d".to_string())));
        assert!(!spine.contains(&("main".to_string(), "a".to_string())));
    }

    #[test]
    fn barycenter_removes_simple_crossing() {
        // Role order starts the children crossed relative to their parents.
        let graph = graph(&[
            ("main", "init_a"),
            ("main", "write_b"),
            ("init_a", "zeta"),
            ("write_b", "alpha"),
        ]);
        let assignment = assign_levels(&graph, &mut Vec::new());
        let order = order_levels(&graph, &assignment.levels, 4);
        assert_eq!(order[1], vec!["init_a", "write_b"]);
        assert_eq!(order[2], vec!["zeta", "alpha"]);
        assert_eq!(count_crossings(&graph, &order), 0);
    }

    #[test]
    fn ordering_is_deterministic_for_symmetric_levels() {
        let graph = graph(&[("main", "b"), ("main", "a"), ("main", "c")]);
        let assignment = assign_levels(&graph, &mut Vec::new());
        let order = order_levels(&graph, &assignment.levels, 4);
        assert_eq!(order[1], vec!["a", "b", "c"]);
    }
}
