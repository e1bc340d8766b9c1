use std::{
    fs,
    path::PathBuf,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use maze_replay::{
    Cell, ColorMode, Edge, Event, EventLog, GridSize, Replay,
    state::{FRONTIER_FRAMES, HueColor},
};

fn unique_temp_dir() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("maze_replay_replay_{nanos}"))
}

fn c(x: i32, y: i32) -> Cell {
    Cell::new(x, y)
}

fn scenario() -> EventLog {
    EventLog::new(
        GridSize::new(3, 3),
        c(0, 0),
        c(2, 2),
        vec![
            Event::activate(c(0, 0)),
            Event::link(c(0, 0), c(1, 0)),
            Event::explore(c(1, 0), Some(c(0, 0))),
            Event::path(vec![c(0, 0), c(1, 0)]),
        ],
    )
}

#[test]
fn three_by_three_scenario_replays_to_expected_state() {
    let mut replay = Replay::new(Arc::new(scenario()), ColorMode::Distance);
    assert_eq!(replay.run(usize::MAX), 4);

    let state = replay.state();
    let carved: Vec<Cell> = state.carved_cells.keys().copied().collect();
    assert_eq!(carved, vec![c(0, 0), c(1, 0)]);

    let explored = &state.explored_cells[&c(1, 0)];
    assert_eq!(explored.distance, 1);
    assert_eq!(explored.color.hue, 10);

    let path: Vec<Cell> = state.path_cells.keys().copied().collect();
    assert_eq!(path, vec![c(0, 0), c(1, 0)]);
    assert_eq!(state.path_edges.len(), 1);
    let (&(edge, _), segment) = state.path_edges.first().expect("one path edge");
    assert_eq!(edge, Edge::new(c(0, 0), c(1, 0)));
    assert_eq!((segment.from, segment.to), (c(0, 0), c(1, 0)));
}

#[test]
fn scenario_loads_from_json_file() {
    let dir = unique_temp_dir();
    fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join("scenario.json");
    fs::write(
        &path,
        r#"{
          "grid": {"width": 3, "height": 3},
          "start": [0, 0],
          "target": [2, 2],
          "events": [
            {"phase": "generate", "event": "activate", "cell": [0, 0]},
            {"phase": "generate", "event": "link", "parent": [0, 0], "child": [1, 0]},
            {"phase": "solve", "event": "explore", "cell": [1, 0], "parent": [0, 0]},
            {"phase": "solve", "event": "path", "cells": [[0, 0], [1, 0]]}
          ]
        }"#,
    )
    .expect("write log");

    let loaded = EventLog::load_json_file(&path).expect("load log");
    assert_eq!(loaded, scenario());
    assert_eq!(loaded.solver_boundary(), 2);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn explore_distance_is_manhattan_from_start() {
    let start = c(3, 2);
    let cells = [c(3, 2), c(0, 0), c(7, 9), c(3, 5), c(6, 2), c(40, 2)];
    let events = cells.iter().map(|&cell| Event::explore(cell, None)).collect();
    let log = EventLog::new(GridSize::new(50, 50), start, c(0, 0), events);

    let mut replay = Replay::new(Arc::new(log), ColorMode::Distance);
    replay.run(usize::MAX);
    let state = replay.state();

    for cell in cells {
        let expected = cell.manhattan(start);
        let explored = &state.explored_cells[&cell];
        assert_eq!(explored.distance, expected, "distance for {cell}");
        assert_eq!(explored.color, HueColor::for_distance(expected));
        assert_eq!(explored.color.hue, (expected * 10) % 360);
        assert_eq!(state.distance_map[&cell], expected);
    }
    assert_eq!(state.distance_map[&start], 0);
    assert_eq!(state.max_distance_seen, 37);
}

#[test]
fn second_path_replaces_the_first() {
    let log = EventLog::new(
        GridSize::new(4, 4),
        c(0, 0),
        c(3, 3),
        vec![
            Event::path(vec![c(0, 0), c(1, 0), c(2, 0)]),
            Event::path(vec![c(0, 0), c(0, 1)]),
        ],
    );
    let mut replay = Replay::new(Arc::new(log), ColorMode::Distance);
    replay.run(usize::MAX);

    let state = replay.state();
    let cells: Vec<Cell> = state.path_cells.keys().copied().collect();
    assert_eq!(cells, vec![c(0, 0), c(0, 1)]);
    let edges: Vec<Edge> = state.path_edges.keys().map(|(edge, _)| *edge).collect();
    assert_eq!(edges, vec![Edge::new(c(0, 0), c(0, 1))]);
}

#[test]
fn seek_to_solver_matches_a_fresh_prefix_replay() {
    let log = Arc::new(EventLog::new(
        GridSize::new(3, 3),
        c(0, 0),
        c(2, 2),
        vec![
            Event::activate(c(0, 0)),
            Event::link(c(0, 0), c(0, 1)),
            Event::link(c(0, 1), c(1, 1)),
            Event::explore(c(0, 1), Some(c(0, 0))),
            Event::explore(c(1, 1), Some(c(0, 1))),
            Event::path(vec![c(0, 0), c(0, 1), c(1, 1)]),
        ],
    ));

    let mut jumped = Replay::new(Arc::clone(&log), ColorMode::Distance);
    jumped.run(usize::MAX);
    assert_eq!(jumped.seek_to_solver(), 3);
    assert_eq!(jumped.cursor(), log.solver_boundary());

    let mut prefix = Replay::new(Arc::clone(&log), ColorMode::Distance);
    for event in &log.events()[..3] {
        assert!(prefix.step(), "event {event:?} should apply");
    }
    assert_eq!(jumped.state(), prefix.state());
    assert!(jumped.state().explored_cells.is_empty());
    assert!(jumped.state().path_cells.is_empty());
}

#[test]
fn seek_to_solver_without_solve_events_lands_on_the_end() {
    let log = EventLog::new(
        GridSize::new(2, 2),
        c(0, 0),
        c(1, 1),
        vec![Event::activate(c(0, 0)), Event::activate(c(1, 0))],
    );
    let mut replay = Replay::new(Arc::new(log), ColorMode::Distance);
    assert_eq!(replay.seek_to_solver(), 2);
    assert!(replay.is_finished());
}

#[test]
fn fresh_activation_carries_full_highlight() {
    let mut replay = Replay::new(Arc::new(scenario()), ColorMode::Distance);
    replay.step();
    assert_eq!(replay.state().carved_cells[&c(0, 0)].highlight, FRONTIER_FRAMES);
}
