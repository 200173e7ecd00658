use std::collections::{BTreeMap, HashMap};

use crate::config::LayoutConfig;
use crate::ir::EdgeKind;

use super::types::{EdgeLayout, NodeLayout, RowLayout};

const STRAIGHT_TOLERANCE: f32 = 2.0;
const MAX_LANE_ATTEMPTS: usize = 48;

/// One call to route, with its kind already decided.
#[derive(Debug, Clone)]
pub(super) struct RouteRequest {
    pub(super) from: String,
    pub(super) to: String,
    pub(super) kind: EdgeKind,
    pub(super) multiplicity: usize,
}

#[derive(Debug, Clone)]
pub(super) struct Obstacle {
    pub(super) id: String,
    pub(super) x: f32,
    pub(super) y: f32,
    pub(super) width: f32,
    pub(super) height: f32,
}

/// Vertical run already claimed by an upward route.
#[derive(Debug, Clone, Copy)]
struct Lane {
    x: f32,
    y_min: f32,
    y_max: f32,
}

struct Router<'a> {
    nodes: &'a BTreeMap<String, NodeLayout>,
    rows: &'a [RowLayout],
    config: &'a LayoutConfig,
    obstacles: Vec<Obstacle>,
    bottom_ports: HashMap<(String, String), f32>,
    top_ports: HashMap<(String, String), f32>,
    lateral_counts: HashMap<usize, usize>,
    channel_counts: HashMap<usize, usize>,
    gap_counts: HashMap<(usize, i64), usize>,
    lanes: Vec<Lane>,
}

/// Route every request in order. Requests whose endpoints are not placed on
/// the grid are dropped.
pub(super) fn route_edges(
    nodes: &BTreeMap<String, NodeLayout>,
    rows: &[RowLayout],
    requests: &[RouteRequest],
    config: &LayoutConfig,
) -> Vec<EdgeLayout> {
    let (bottom_ports, top_ports) = assign_ports(nodes, requests);
    let mut router = Router {
        nodes,
        rows,
        config,
        obstacles: build_obstacles(nodes, config.obstacle_padding),
        bottom_ports,
        top_ports,
        lateral_counts: HashMap::new(),
        channel_counts: HashMap::new(),
        gap_counts: HashMap::new(),
        lanes: Vec::new(),
    };

    let mut routed = Vec::with_capacity(requests.len());
    for request in requests {
        let (Some(from), Some(to)) = (nodes.get(&request.from), nodes.get(&request.to)) else {
            continue;
        };
        let (Some(from_level), Some(to_level)) = (from.level, to.level) else {
            continue;
        };
        let points = if request.from == request.to {
            route_self_loop(from, config.lateral_buffer)
        } else if to_level == from_level {
            router.route_lateral(from, to, from_level)
        } else if to_level < from_level {
            router.route_upward(from, to, to_level)
        } else if to_level == from_level + 1 {
            router.route_adjacent(from, to, from_level)
        } else {
            router.route_long_span(from, to, from_level, to_level)
        };
        routed.push(EdgeLayout {
            from: request.from.clone(),
            to: request.to.clone(),
            kind: request.kind,
            multiplicity: request.multiplicity,
            points: simplify_path(points),
        });
    }
    routed
}

impl Router<'_> {
    fn row_top(&self, level: usize) -> f32 {
        self.rows.get(level).map_or(0.0, |row| row.y)
    }

    fn row_bottom(&self, level: usize) -> f32 {
        self.rows.get(level).map_or(0.0, |row| row.y + row.height)
    }

    /// Free band between `upper` and the next level down.
    fn channel(&self, upper: usize) -> (f32, f32) {
        let top = self.row_bottom(upper);
        let bottom = self.row_top(upper + 1);
        ((top + bottom) / 2.0, (bottom - top).max(0.0))
    }

    fn channel_y(&self, upper: usize) -> f32 {
        let (mid, height) = self.channel(upper);
        let counter = self.channel_counts.get(&upper).copied().unwrap_or(0);
        mid + lane_offset(counter, self.config.lane_step, height)
    }

    fn route_adjacent(&mut self, from: &NodeLayout, to: &NodeLayout, level: usize) -> Vec<(f32, f32)> {
        let key = (from.id.clone(), to.id.clone());
        let start = (
            self.bottom_ports.get(&key).copied().unwrap_or(from.center().0),
            from.bottom(),
        );
        let end = (
            self.top_ports.get(&key).copied().unwrap_or(to.center().0),
            to.y,
        );
        if (start.0 - end.0).abs() < STRAIGHT_TOLERANCE {
            return vec![start, (start.0, end.1)];
        }
        let mid = self.channel_y(level);
        *self.channel_counts.entry(level).or_default() += 1;
        vec![start, (start.0, mid), (end.0, mid), end]
    }

    fn route_long_span(
        &mut self,
        from: &NodeLayout,
        to: &NodeLayout,
        from_level: usize,
        to_level: usize,
    ) -> Vec<(f32, f32)> {
        let key = (from.id.clone(), to.id.clone());
        let start = (
            self.bottom_ports.get(&key).copied().unwrap_or(from.center().0),
            from.bottom(),
        );
        let end = (
            self.top_ports.get(&key).copied().unwrap_or(to.center().0),
            to.y,
        );
        let mut points = vec![start];
        let mut current_x = start.0;
        for level in from_level + 1..to_level {
            let above = self.channel_y(level - 1);
            *self.channel_counts.entry(level - 1).or_default() += 1;
            let row_mid = (self.row_top(level) + self.row_bottom(level)) / 2.0;
            let t = (row_mid - start.1) / (end.1 - start.1).max(1.0);
            let desired = start.0 + (end.0 - start.0) * t.clamp(0.0, 1.0);
            let x = self.pass_through_row(level, desired);
            points.push((current_x, above));
            points.push((x, above));
            current_x = x;
        }
        let below = self.channel_y(to_level - 1);
        *self.channel_counts.entry(to_level - 1).or_default() += 1;
        points.push((current_x, below));
        points.push((end.0, below));
        points.push(end);
        points
    }

    /// Pick an x that crosses `level` between its nodes, as close to
    /// `desired` as the gaps allow.
    fn pass_through_row(&mut self, level: usize, desired: f32) -> f32 {
        let pad = self.config.obstacle_padding;
        let mut spans: Vec<(f32, f32)> = self
            .rows
            .get(level)
            .map(|row| {
                row.nodes
                    .iter()
                    .filter_map(|id| self.nodes.get(id))
                    .map(|node| (node.x - pad, node.right() + pad))
                    .collect()
            })
            .unwrap_or_default();
        spans.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        if !spans.iter().any(|(lo, hi)| desired > *lo && desired < *hi) {
            return desired;
        }

        // (centre, half width) of every gap, outer sides included.
        let buffer = self.config.lateral_buffer;
        let mut gaps: Vec<(f32, f32)> = Vec::new();
        if let (Some(first), Some(last)) = (spans.first(), spans.last()) {
            gaps.push((first.0 - buffer, buffer));
            gaps.push((last.1 + buffer, buffer));
        }
        for pair in spans.windows(2) {
            let (lo, hi) = (pair[0].1, pair[1].0);
            if hi > lo {
                gaps.push(((lo + hi) / 2.0, (hi - lo) / 2.0));
            }
        }
        let Some((centre, half)) = gaps.into_iter().min_by(|a, b| {
            let da = (a.0 - desired).abs();
            let db = (b.0 - desired).abs();
            da.partial_cmp(&db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        }) else {
            return desired;
        };
        let slot = (level, centre.round() as i64);
        let counter = self.gap_counts.get(&slot).copied().unwrap_or(0);
        *self.gap_counts.entry(slot).or_default() += 1;
        centre + lane_offset(counter, self.config.lane_step, half * 2.0)
    }

    fn route_lateral(&mut self, from: &NodeLayout, to: &NodeLayout, level: usize) -> Vec<(f32, f32)> {
        let rightward = to.center().0 >= from.center().0;
        if from.rank.abs_diff(to.rank) == 1 {
            let (sx, ex) = if rightward {
                (from.right(), to.x)
            } else {
                (from.x, to.right())
            };
            let (sy, ey) = (from.center().1, to.center().1);
            if (sy - ey).abs() < STRAIGHT_TOLERANCE {
                return vec![(sx, sy), (ex, sy)];
            }
            let mid_x = (sx + ex) / 2.0;
            return vec![(sx, sy), (mid_x, sy), (mid_x, ey), (ex, ey)];
        }

        let counter = self.lateral_counts.entry(level).or_default();
        let k = *counter;
        *counter += 1;
        let offset = self.config.lateral_buffer + (k / 2) as f32 * self.config.lane_step;
        let toward = |node: &NodeLayout, right: bool| {
            let quarter = node.width / 4.0;
            if right {
                node.center().0 + quarter
            } else {
                node.center().0 - quarter
            }
        };
        let sx = toward(from, rightward);
        let ex = toward(to, !rightward);
        if k % 2 == 0 {
            let y = self.row_top(level) - offset;
            vec![(sx, from.y), (sx, y), (ex, y), (ex, to.y)]
        } else {
            let y = self.row_bottom(level) + offset;
            vec![(sx, from.bottom()), (sx, y), (ex, y), (ex, to.bottom())]
        }
    }

    /// Leave the caller sideways, climb in a free vertical lane, cross over
    /// in the channel above the callee and enter it from the side.
    fn route_upward(&mut self, from: &NodeLayout, to: &NodeLayout, to_level: usize) -> Vec<(f32, f32)> {
        let buffer = self.config.lateral_buffer;
        let step = self.config.lane_step;
        let toward_left = to.center().0 < from.center().0;
        let dir = if toward_left { -1.0 } else { 1.0 };
        let start = if toward_left {
            (from.x, from.center().1)
        } else {
            (from.right(), from.center().1)
        };
        let cross_y = self.row_top(to_level) - buffer;
        let base = start.0 + dir * buffer;

        let candidate = |lane_x: f32| {
            let enter_left = lane_x < to.center().0;
            let (side_x, end_x) = if enter_left {
                (to.x - buffer / 2.0, to.x)
            } else {
                (to.right() + buffer / 2.0, to.right())
            };
            let end_y = to.center().1;
            vec![
                start,
                (lane_x, start.1),
                (lane_x, cross_y),
                (side_x, cross_y),
                (side_x, end_y),
                (end_x, end_y),
            ]
        };

        let mut chosen = None;
        for attempt in 0..MAX_LANE_ATTEMPTS {
            let lane_x = base + dir * attempt as f32 * step;
            let path = candidate(lane_x);
            if self.lane_is_free(lane_x, cross_y, start.1)
                && path_is_clear(&path, &self.obstacles, &from.id, &to.id)
            {
                chosen = Some((lane_x, path));
                break;
            }
        }
        let (lane_x, path) = chosen.unwrap_or_else(|| {
            tracing::debug!(from = %from.id, to = %to.id, "no clear side lane, using nearest");
            (base, candidate(base))
        });
        self.lanes.push(Lane {
            x: lane_x,
            y_min: cross_y.min(start.1),
            y_max: cross_y.max(start.1),
        });
        path
    }

    fn lane_is_free(&self, x: f32, y1: f32, y2: f32) -> bool {
        let (lo, hi) = (y1.min(y2), y1.max(y2));
        let spacing = self.config.lane_step * 0.5;
        !self
            .lanes
            .iter()
            .any(|lane| (lane.x - x).abs() < spacing && lane.y_min < hi && lo < lane.y_max)
    }
}

/// Offsets 0, +step, -step, +2step, ... bounded to the band height.
fn lane_offset(counter: usize, step: f32, band: f32) -> f32 {
    if step <= 0.0 {
        return 0.0;
    }
    let max_steps = ((band / 2.0 - step) / step).floor().max(0.0) as usize;
    let counter = counter % (max_steps * 2 + 1);
    if counter == 0 {
        return 0.0;
    }
    let n = counter.div_ceil(2) as f32;
    if counter % 2 == 1 { n * step } else { -n * step }
}

/// Spread exits along the caller's bottom and entries along the callee's top
/// for every downward call, ordered by the far end's position.
fn assign_ports(
    nodes: &BTreeMap<String, NodeLayout>,
    requests: &[RouteRequest],
) -> (HashMap<(String, String), f32>, HashMap<(String, String), f32>) {
    let mut outgoing: BTreeMap<&str, Vec<&RouteRequest>> = BTreeMap::new();
    let mut incoming: BTreeMap<&str, Vec<&RouteRequest>> = BTreeMap::new();
    for request in requests {
        let (Some(from), Some(to)) = (nodes.get(&request.from), nodes.get(&request.to)) else {
            continue;
        };
        if let (Some(lf), Some(lt)) = (from.level, to.level) {
            if lt > lf {
                outgoing.entry(request.from.as_str()).or_default().push(request);
                incoming.entry(request.to.as_str()).or_default().push(request);
            }
        }
    }

    let mut bottom = HashMap::new();
    let mut top = HashMap::new();
    for (id, mut list) in outgoing {
        if let Some(node) = nodes.get(id) {
            spread_ports(node, &mut list, nodes, callee_of, &mut bottom);
        }
    }
    for (id, mut list) in incoming {
        if let Some(node) = nodes.get(id) {
            spread_ports(node, &mut list, nodes, caller_of, &mut top);
        }
    }
    (bottom, top)
}

fn callee_of(request: &RouteRequest) -> &str {
    &request.to
}

fn caller_of(request: &RouteRequest) -> &str {
    &request.from
}

fn spread_ports(
    node: &NodeLayout,
    list: &mut [&RouteRequest],
    nodes: &BTreeMap<String, NodeLayout>,
    other: fn(&RouteRequest) -> &str,
    ports: &mut HashMap<(String, String), f32>,
) {
    list.sort_by(|a, b| {
        let ax = nodes.get(other(a)).map_or(0.0, |n| n.center().0);
        let bx = nodes.get(other(b)).map_or(0.0, |n| n.center().0);
        ax.partial_cmp(&bx)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| other(a).cmp(other(b)))
    });
    let count = list.len() as f32;
    for (idx, request) in list.iter().enumerate() {
        let x = node.x + node.width * (idx as f32 + 1.0) / (count + 1.0);
        ports.insert((request.from.clone(), request.to.clone()), x);
    }
}

pub(super) fn build_obstacles(nodes: &BTreeMap<String, NodeLayout>, pad: f32) -> Vec<Obstacle> {
    nodes
        .values()
        .filter(|node| !node.is_isolated())
        .map(|node| Obstacle {
            id: node.id.clone(),
            x: node.x - pad,
            y: node.y - pad,
            width: node.width + pad * 2.0,
            height: node.height + pad * 2.0,
        })
        .collect()
}

fn path_is_clear(points: &[(f32, f32)], obstacles: &[Obstacle], from: &str, to: &str) -> bool {
    points.windows(2).all(|segment| {
        obstacles
            .iter()
            .filter(|obstacle| obstacle.id != from && obstacle.id != to)
            .all(|obstacle| !segment_intersects_rect(segment[0], segment[1], obstacle))
    })
}

/// Loop out of the bottom and back into the right side of the same node.
pub(super) fn route_self_loop(node: &NodeLayout, pad: f32) -> Vec<(f32, f32)> {
    let start = (node.x + node.width / 2.0, node.y + node.height);
    let p1 = (node.x + node.width / 2.0, node.y + node.height + pad);
    let p2 = (node.x + node.width + pad, node.y + node.height + pad);
    let p3 = (node.x + node.width + pad, node.y + node.height / 2.0);
    let end = (node.x + node.width, node.y + node.height / 2.0);
    vec![start, p1, p2, p3, end]
}

/// Drop repeated points and middle points of straight runs, keeping both
/// endpoints.
pub(super) fn simplify_path(points: Vec<(f32, f32)>) -> Vec<(f32, f32)> {
    let mut deduped: Vec<(f32, f32)> = Vec::with_capacity(points.len());
    for point in points {
        if deduped
            .last()
            .is_some_and(|last| (last.0 - point.0).abs() < 1e-3 && (last.1 - point.1).abs() < 1e-3)
        {
            continue;
        }
        deduped.push(point);
    }
    if deduped.len() <= 2 {
        return deduped;
    }
    let mut out = vec![deduped[0]];
    for idx in 1..deduped.len() - 1 {
        let prev = out[out.len() - 1];
        let cur = deduped[idx];
        let next = deduped[idx + 1];
        let vertical = (prev.0 - cur.0).abs() < 1e-3 && (cur.0 - next.0).abs() < 1e-3;
        let horizontal = (prev.1 - cur.1).abs() < 1e-3 && (cur.1 - next.1).abs() < 1e-3;
        if !vertical && !horizontal {
            out.push(cur);
        }
    }
    out.push(deduped[deduped.len() - 1]);
    out
}

pub(super) fn segment_intersects_rect(a: (f32, f32), b: (f32, f32), rect: &Obstacle) -> bool {
    let (x1, y1) = a;
    let (x2, y2) = b;
    if x1.max(x2) < rect.x
        || x1.min(x2) > rect.x + rect.width
        || y1.max(y2) < rect.y
        || y1.min(y2) > rect.y + rect.height
    {
        return false;
    }
    let inside = |(x, y): (f32, f32)| {
        x >= rect.x && x <= rect.x + rect.width && y >= rect.y && y <= rect.y + rect.height
    };
    if inside(a) || inside(b) {
        return true;
    }
    let corners = [
        (rect.x, rect.y),
        (rect.x + rect.width, rect.y),
        (rect.x + rect.width, rect.y + rect.height),
        (rect.x, rect.y + rect.height),
    ];
    (0..4).any(|idx| segments_intersect(a, b, corners[idx], corners[(idx + 1) % 4]))
}

pub(super) fn segments_intersect(a: (f32, f32), b: (f32, f32), c: (f32, f32), d: (f32, f32)) -> bool {
    fn orient(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
        (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
    }
    fn on_segment(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> bool {
        c.0 >= a.0.min(b.0) - 1e-6
            && c.0 <= a.0.max(b.0) + 1e-6
            && c.1 >= a.1.min(b.1) - 1e-6
            && c.1 <= a.1.max(b.1) + 1e-6
    }
    let o1 = orient(a, b, c);
    let o2 = orient(a, b, d);
    let o3 = orient(c, d, a);
    let o4 = orient(c, d, b);
    if (o1 > 0.0 && o2 < 0.0 || o1 < 0.0 && o2 > 0.0)
        && (o3 > 0.0 && o4 < 0.0 || o3 < 0.0 && o4 > 0.0)
    {
        return true;
    }
    (o1.abs() <= 1e-6 && on_segment(a, b, c))
        || (o2.abs() <= 1e-6 && on_segment(a, b, d))
        || (o3.abs() <= 1e-6 && on_segment(c, d, a))
        || (o4.abs() <= 1e-6 && on_segment(c, d, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Category;
    use crate::layout::types::TextBlock;

    fn node(id: &str, level: usize, rank: usize, x: f32, y: f32) -> NodeLayout {
        NodeLayout {
            id: id.to_string(),
            label: TextBlock {
                lines: vec![id.to_string()],
                width: 40.0,
                height: 15.0,
            },
            category: Category::Generic,
            level: Some(level),
            rank,
            x,
            y,
            width: 100.0,
            height: 50.0,
            font_size: 11.0,
        }
    }

    fn rows(nodes: &BTreeMap<String, NodeLayout>) -> Vec<RowLayout> {
        let mut rows: Vec<RowLayout> = Vec::new();
        for node in nodes.values() {
            let level = node.level.unwrap_or(0);
            while rows.len() <= level {
                rows.push(RowLayout {
                    level: rows.len(),
                    y: node.y,
                    height: 50.0,
                    nodes: Vec::new(),
                });
            }
            rows[level].y = node.y;
            rows[level].nodes.push(node.id.clone());
        }
        rows
    }

    fn request(from: &str, to: &str, kind: EdgeKind) -> RouteRequest {
        RouteRequest {
            from: from.to_string(),
            to: to.to_string(),
            kind,
            multiplicity: 1,
        }
    }

    fn place(list: Vec<NodeLayout>) -> BTreeMap<String, NodeLayout> {
        list.into_iter().map(|n| (n.id.clone(), n)).collect()
    }

    #[test]
    fn adjacent_aligned_edge_is_straight() {
        let nodes = place(vec![node("a", 0, 0, 100.0, 100.0), node("b", 1, 0, 100.0, 300.0)]);
        let edges = route_edges(
            &nodes,
            &rows(&nodes),
            &[request("a", "b", EdgeKind::Call)],
            &LayoutConfig::default(),
        );
        assert_eq!(edges[0].points, vec![(150.0, 150.0), (150.0, 300.0)]);
    }

    #[test]
    fn long_span_steps_around_intervening_row() {
        let nodes = place(vec![
            node("a", 0, 0, 100.0, 100.0),
            node("mid", 1, 0, 100.0, 300.0),
            node("z", 2, 0, 100.0, 500.0),
            node("a2", 1, 1, 400.0, 300.0),
        ]);
        let config = LayoutConfig::default();
        let obstacles = build_obstacles(&nodes, config.obstacle_padding);
        let edges = route_edges(
            &nodes,
            &rows(&nodes),
            &[request("a", "z", EdgeKind::Call)],
            &config,
        );
        let points = &edges[0].points;
        assert!(points.len() > 2);
        assert!(path_is_clear(points, &obstacles, "a", "z"));
    }

    #[test]
    fn upward_edge_uses_side_lane_clear_of_nodes() {
        let nodes = place(vec![
            node("main", 0, 0, 200.0, 100.0),
            node("init", 1, 0, 60.0, 300.0),
            node("process", 1, 1, 340.0, 300.0),
            node("helper", 2, 0, 200.0, 500.0),
        ]);
        let config = LayoutConfig::default();
        let obstacles = build_obstacles(&nodes, config.obstacle_padding);
        let edges = route_edges(
            &nodes,
            &rows(&nodes),
            &[request("helper", "main", EdgeKind::Callback)],
            &config,
        );
        let points = &edges[0].points;
        assert!(path_is_clear(points, &obstacles, "helper", "main"));
        // Starts and ends on side edges.
        assert_eq!(points[0], (300.0, 525.0));
        assert_eq!(points[points.len() - 1], (300.0, 125.0));
        assert!(points.iter().any(|p| p.0 > 300.0));
    }

    #[test]
    fn lateral_arcs_alternate_and_spread() {
        let nodes = place(vec![
            node("a", 0, 0, 0.0, 100.0),
            node("b", 0, 1, 200.0, 100.0),
            node("c", 0, 2, 400.0, 100.0),
        ]);
        let config = LayoutConfig::default();
        let edges = route_edges(
            &nodes,
            &rows(&nodes),
            &[
                request("a", "c", EdgeKind::Lateral),
                request("c", "a", EdgeKind::Lateral),
                request("a", "b", EdgeKind::Lateral),
            ],
            &config,
        );
        let first_y = edges[0].points[1].1;
        let second_y = edges[1].points[1].1;
        assert!(first_y < 100.0, "first arc goes above");
        assert!(second_y > 150.0, "second arc goes below");
        assert_eq!(edges[2].points, vec![(100.0, 125.0), (200.0, 125.0)]);
    }

    #[test]
    fn self_loop_stays_outside_node() {
        let n = node("r", 0, 0, 0.0, 0.0);
        let points = route_self_loop(&n, 30.0);
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], (50.0, 50.0));
        assert_eq!(points[4], (100.0, 25.0));
    }

    #[test]
    fn lane_offsets_alternate_and_wrap() {
        assert_eq!(lane_offset(0, 10.0, 100.0), 0.0);
        assert_eq!(lane_offset(1, 10.0, 100.0), 10.0);
        assert_eq!(lane_offset(2, 10.0, 100.0), -10.0);
        assert_eq!(lane_offset(3, 10.0, 100.0), 20.0);
        // Band of 30 allows only the centre lane.
        assert_eq!(lane_offset(5, 10.0, 30.0), 0.0);
    }

    #[test]
    fn simplify_drops_collinear_points() {
        let path = simplify_path(vec![(0.0, 0.0), (0.0, 5.0), (0.0, 10.0), (0.0, 10.0), (5.0, 10.0)]);
        assert_eq!(path, vec![(0.0, 0.0), (0.0, 10.0), (5.0, 10.0)]);
    }

    #[test]
    fn segment_rect_intersection() {
        let rect = Obstacle {
            id: "r".to_string(),
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        assert!(segment_intersects_rect((-5.0, 5.0), (15.0, 5.0), &rect));
        assert!(!segment_intersects_rect((-5.0, 20.0), (15.0, 20.0), &rect));
    }
}
