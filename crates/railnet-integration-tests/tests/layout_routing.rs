//! End-to-end routing through layouts drawn on the grid.
//!
//! Each test places pieces, wires the layout, then follows trains through
//! the resulting graph with switches in different stands.

use railnet_core::direction::{Direction, DirectionSet};
use railnet_core::id::{NodeId, TrackId};
use railnet_core::stand::SwitchStand;
use railnet_core::symbol::Symbol;
use railnet_core::test_utils::init_test_logging;
use railnet_core::trace::TraceEnd;
use railnet_layout::{GridPosition, Layout, LayoutConfig, LayoutError};

fn pos(x: i32, y: i32) -> GridPosition {
    GridPosition::new(x, y)
}

fn piece(directions: &[Direction]) -> Symbol {
    Symbol::new(directions.iter().copied().collect::<DirectionSet>()).unwrap()
}

fn node_at(layout: &Layout, position: GridPosition, direction: Direction) -> NodeId {
    layout.node_toward(position, direction).unwrap()
}

// ============================================================================
// Siding
// ============================================================================

/// A right switch with a buffer stop on each of its three ends.
///
/// ```text
///   (0,0) (1,0)
///     |   /
///   (0,1)
///     |
///   (0,2)
/// ```
fn siding() -> Layout {
    let mut layout = Layout::new();
    layout.place(pos(0, 2), Symbol::END).unwrap();
    layout.place(pos(0, 1), Symbol::RIGHT_SWITCH).unwrap();
    layout.place(pos(0, 0), piece(&[Direction::Bottom])).unwrap();
    layout.place(pos(1, 0), piece(&[Direction::BottomLeft])).unwrap();
    layout
}

#[test]
fn siding_wires_every_end() {
    init_test_logging();
    let mut layout = siding();
    let report = layout.wire().unwrap();
    assert_eq!(report.linked, 3);
    assert!(report.dangling.is_empty());
    assert_eq!(layout.graph().node_count(), 4);
    assert_eq!(layout.start_positions(), vec![pos(0, 0), pos(1, 0)]);
}

#[test]
fn siding_follows_switch_stand() {
    init_test_logging();
    let mut layout = siding();
    layout.wire().unwrap();
    let switch = node_at(&layout, pos(0, 1), Direction::Bottom);
    let main = node_at(&layout, pos(0, 0), Direction::Bottom);
    let branch = node_at(&layout, pos(1, 0), Direction::BottomLeft);

    let trace = layout.trace(pos(0, 1), Direction::Bottom, 10).unwrap();
    assert_eq!(trace.nodes, vec![switch, main]);
    assert!(matches!(trace.end, TraceEnd::DeadEnd { at, .. } if at == main));

    assert_eq!(layout.turn(pos(0, 1), SwitchStand::Bend1), Ok(1));
    let trace = layout.trace(pos(0, 1), Direction::Bottom, 10).unwrap();
    assert_eq!(trace.nodes, vec![switch, branch]);
}

#[test]
fn siding_blocks_trailing_move_from_inactive_branch() {
    init_test_logging();
    let mut layout = siding();
    layout.wire().unwrap();
    let switch = node_at(&layout, pos(0, 1), Direction::Bottom);
    let stop = node_at(&layout, pos(0, 2), Direction::Top);

    // Coming down the main line with the switch set for the branch.
    layout.turn(pos(0, 1), SwitchStand::Bend2).unwrap();
    let trace = layout.trace(pos(0, 1), Direction::Top, 10).unwrap();
    assert_eq!(trace.nodes, vec![switch]);
    assert_eq!(trace.end, TraceEnd::Blocked { at: switch });

    // Coming down the branch it runs through to the buffer stop.
    let trace = layout.trace(pos(0, 1), Direction::TopRight, 10).unwrap();
    assert_eq!(trace.nodes, vec![switch, stop]);
}

// ============================================================================
// Loop
// ============================================================================

/// Eight bends turning clockwise close a loop.
fn octagon() -> (Layout, Vec<GridPosition>) {
    let cells = [
        (pos(0, 0), [Direction::Left, Direction::BottomRight]),
        (pos(1, 1), [Direction::TopLeft, Direction::Bottom]),
        (pos(1, 2), [Direction::Top, Direction::BottomLeft]),
        (pos(0, 3), [Direction::TopRight, Direction::Left]),
        (pos(-1, 3), [Direction::Right, Direction::TopLeft]),
        (pos(-2, 2), [Direction::BottomRight, Direction::Top]),
        (pos(-2, 1), [Direction::Bottom, Direction::TopRight]),
        (pos(-1, 0), [Direction::BottomLeft, Direction::Right]),
    ];
    let mut layout = Layout::new();
    for (position, ends) in &cells {
        let symbol = piece(ends);
        assert!(symbol.is_bend());
        layout.place(*position, symbol).unwrap();
    }
    (layout, cells.iter().map(|(p, _)| *p).collect())
}

#[test]
fn loop_of_bends_closes() {
    init_test_logging();
    let (mut layout, cells) = octagon();
    let report = layout.wire().unwrap();
    assert_eq!(report.linked, 8);
    assert!(report.dangling.is_empty());

    let trace = layout.trace(cells[0], Direction::Left, 100).unwrap();
    assert_eq!(trace.end, TraceEnd::Looped);
    let visited: Vec<GridPosition> = trace
        .nodes
        .iter()
        .map(|node| layout.position_of(*node).unwrap())
        .collect();
    assert_eq!(visited, cells);
}

#[test]
fn loop_trace_respects_limit() {
    init_test_logging();
    let (mut layout, cells) = octagon();
    layout.wire().unwrap();
    let trace = layout.trace(cells[0], Direction::Left, 5).unwrap();
    assert_eq!(trace.len(), 5);
    assert_eq!(trace.end, TraceEnd::LimitReached);
}

#[test]
fn breaking_the_loop_leaves_two_dead_ends() {
    init_test_logging();
    let (mut layout, cells) = octagon();
    layout.wire().unwrap();
    layout.remove(cells[4]).unwrap();

    let report = layout.wire().unwrap();
    assert_eq!(report.linked, 6);
    assert_eq!(
        report.dangling,
        vec![(cells[5], Direction::BottomRight), (cells[3], Direction::Left)]
    );

    let trace = layout.trace(cells[0], Direction::Left, 100).unwrap();
    assert_eq!(trace.len(), 4);
    assert!(matches!(trace.end, TraceEnd::DeadEnd { .. }));
    assert_eq!(trace.last().and_then(|n| layout.position_of(n)), Some(cells[3]));
}

// ============================================================================
// Crossings
// ============================================================================

/// A plain crossing with a straight on each arm.
#[test]
fn plain_crossing_keeps_lines_apart() {
    init_test_logging();
    let mut layout = Layout::new();
    layout.place(pos(0, 0), Symbol::CROSS_OVER).unwrap();
    layout.place(pos(0, -1), Symbol::STRAIGHT).unwrap();
    layout.place(pos(0, 1), Symbol::STRAIGHT).unwrap();
    layout.place(pos(-1, 0), Symbol::STRAIGHT.rotated(2)).unwrap();
    layout.place(pos(1, 0), Symbol::STRAIGHT.rotated(2)).unwrap();

    let report = layout.wire().unwrap();
    assert_eq!(report.linked, 4);
    assert_eq!(report.dangling.len(), 4);

    let vertical = node_at(&layout, pos(0, 0), Direction::Top);
    let horizontal = node_at(&layout, pos(0, 0), Direction::Left);
    assert_ne!(vertical, horizontal);

    let trace = layout.trace(pos(0, 0), Direction::Bottom, 10).unwrap();
    assert_eq!(trace.nodes, vec![vertical, node_at(&layout, pos(0, -1), Direction::Top)]);

    let trace = layout.trace(pos(0, 0), Direction::Right, 10).unwrap();
    assert_eq!(trace.nodes, vec![horizontal, node_at(&layout, pos(-1, 0), Direction::Left)]);
}

/// A crossover switch with buffer stops on all four ends.
#[test]
fn crossover_switch_connects_one_pair_per_stand() {
    init_test_logging();
    let mut layout = Layout::new();
    layout.place(pos(0, 0), Symbol::CROSS_OVER_SWITCH).unwrap();
    layout.place(pos(0, -1), piece(&[Direction::Bottom])).unwrap();
    layout.place(pos(1, -1), piece(&[Direction::BottomLeft])).unwrap();
    layout.place(pos(0, 1), piece(&[Direction::Top])).unwrap();
    layout.place(pos(-1, 1), piece(&[Direction::TopRight])).unwrap();
    assert_eq!(layout.wire().unwrap().linked, 4);

    let switch = node_at(&layout, pos(0, 0), Direction::Top);
    let top = node_at(&layout, pos(0, -1), Direction::Bottom);
    let top_right = node_at(&layout, pos(1, -1), Direction::BottomLeft);

    let cases = [
        (SwitchStand::Straight1, Some(top_right)),
        (SwitchStand::Bend1, Some(top)),
        (SwitchStand::Straight2, None),
        (SwitchStand::Bend2, None),
    ];
    for (stand, expected) in cases {
        layout.turn(pos(0, 0), stand).unwrap();
        let trace = layout.trace(pos(0, 0), Direction::Bottom, 10).unwrap();
        match expected {
            Some(exit) => assert_eq!(trace.nodes, vec![switch, exit], "{stand:?}"),
            None => assert_eq!(trace.end, TraceEnd::Blocked { at: switch }, "{stand:?}"),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn config_from_toml_drives_placement() {
    init_test_logging();
    let config = LayoutConfig::from_toml_str(
        "default_stand = \"bend1\"\nfirst_track_id = 100\n",
    )
    .unwrap();
    let mut layout = Layout::with_config(config);
    let main = layout.place(pos(0, 0), Symbol::STRAIGHT).unwrap()[0];
    let switch = layout.place(pos(0, 1), Symbol::LEFT_SWITCH).unwrap()[0];

    assert_eq!(layout.graph().lookup(TrackId(100)), Some(main));
    assert_eq!(layout.graph().lookup(TrackId(101)), Some(switch));
    assert_eq!(
        layout.graph().node(switch).map(|n| n.stand()),
        Some(SwitchStand::Bend1)
    );
    // Blocks keep the default stand.
    assert_eq!(
        layout.graph().node(main).map(|n| n.stand()),
        Some(SwitchStand::Straight1)
    );
}

#[test]
fn strict_config_rejects_open_ends() {
    init_test_logging();
    let config = LayoutConfig::from_toml_str("strict_wiring = true").unwrap();
    let mut layout = Layout::with_config(config);
    layout.place(pos(0, 0), Symbol::END).unwrap();
    layout.place(pos(0, -1), piece(&[Direction::Bottom])).unwrap();
    assert!(layout.wire().is_ok());

    layout.place(pos(5, 5), Symbol::STRAIGHT).unwrap();
    match layout.wire() {
        Err(LayoutError::Dangling(ends)) => {
            assert_eq!(ends, vec![(pos(5, 5), Direction::Top), (pos(5, 5), Direction::Bottom)]);
        }
        other => panic!("expected dangling ends, got {other:?}"),
    }
}
