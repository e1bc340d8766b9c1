use std::{
    cell::RefCell,
    fs,
    path::PathBuf,
    rc::Rc,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use maze_replay::{
    Cell, EncodeJob, EncoderFactory, Event, EventLog, ExportError, FrameEncoder,
    GifEncoderFactory, GridSize, PlaybackState, Player, PlayerConfig, RgbaBufferSurface, Status,
    SurfaceSize,
};

fn unique_temp_dir() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("maze_replay_export_{nanos}"))
}

fn scenario() -> EventLog {
    EventLog::new(
        GridSize::new(3, 3),
        Cell::new(0, 0),
        Cell::new(2, 2),
        vec![
            Event::activate(Cell::new(0, 0)),
            Event::link(Cell::new(0, 0), Cell::new(1, 0)),
            Event::explore(Cell::new(1, 0), Some(Cell::new(0, 0))),
            Event::path(vec![Cell::new(0, 0), Cell::new(1, 0)]),
        ],
    )
}

/// Records `(frame_len, delay_ms)` per frame and finishes immediately.
#[derive(Clone, Default)]
struct RecordingFactory {
    frames: Rc<RefCell<Vec<(usize, u64)>>>,
    fail_on_frame: Option<usize>,
}

struct RecordingEncoder {
    frames: Rc<RefCell<Vec<(usize, u64)>>>,
    fail_on_frame: Option<usize>,
}

impl EncoderFactory for RecordingFactory {
    fn create(&self, _size: SurfaceSize) -> Result<Box<dyn FrameEncoder>, ExportError> {
        Ok(Box::new(RecordingEncoder {
            frames: Rc::clone(&self.frames),
            fail_on_frame: self.fail_on_frame,
        }))
    }
}

impl FrameEncoder for RecordingEncoder {
    fn add_frame(&mut self, rgba: &[u8], delay_ms: u64) -> Result<(), ExportError> {
        let mut frames = self.frames.borrow_mut();
        if self.fail_on_frame == Some(frames.len()) {
            return Err(ExportError::Encode("disk full".to_string()));
        }
        frames.push((rgba.len(), delay_ms));
        Ok(())
    }

    fn render(self: Box<Self>) -> EncodeJob {
        let frames = self.frames.borrow().len();
        EncodeJob::finished(Ok(vec![0u8; frames * 100]))
    }
}

fn player_with(
    config: PlayerConfig,
    statuses: &Rc<RefCell<Vec<Status>>>,
) -> Player<RgbaBufferSurface> {
    let sink = Rc::clone(statuses);
    Player::new(
        config,
        RgbaBufferSurface::new(SurfaceSize::new(1, 1)),
        move |status: &Status| sink.borrow_mut().push(status.clone()),
    )
}

#[test]
fn export_without_encoder_is_unavailable() {
    let statuses = Rc::default();
    let mut player = player_with(PlayerConfig::default(), &statuses);
    player.load_log(scenario());
    player.toggle_playback(Instant::now());
    let cursor = player.cursor();

    let err = player.export_all().expect_err("no encoder");
    assert!(matches!(err, ExportError::Unavailable));
    assert_eq!(player.cursor(), cursor);
    assert!(player.is_playing());
    assert_eq!(
        statuses.borrow().last().map(|s| s.to_string()),
        Some("Error: GIF encoder not available".to_string())
    );
}

#[test]
fn export_without_log_has_nothing_to_export() {
    let statuses = Rc::default();
    let mut player =
        player_with(PlayerConfig::default(), &statuses).with_encoder(RecordingFactory::default());

    let err = player.export_all().expect_err("nothing loaded");
    assert!(matches!(err, ExportError::NothingToExport));
    assert_eq!(statuses.borrow().last(), Some(&Status::NothingToExport));
}

#[test]
fn missing_encoder_is_reported_before_an_empty_log() {
    let statuses = Rc::default();
    let mut player = player_with(PlayerConfig::default(), &statuses);

    let err = player.export_all().expect_err("no encoder");
    assert!(matches!(err, ExportError::Unavailable));
    assert_eq!(
        statuses.borrow().last().map(|s| s.to_string()),
        Some("Error: GIF encoder not available".to_string())
    );
}

#[test]
fn export_while_encoding_keeps_the_first_job() {
    let dir = unique_temp_dir();
    let config = PlayerConfig {
        output_dir: dir.clone(),
        ..PlayerConfig::default()
    };
    let factory = RecordingFactory::default();
    let frames = Rc::clone(&factory.frames);
    let statuses = Rc::default();
    let mut player = player_with(config, &statuses).with_encoder(factory);
    player.load_log(scenario());

    player.export_all().expect("first export starts");
    assert!(player.is_exporting());

    let err = player.export_all().expect_err("second export refused");
    assert!(matches!(err, ExportError::InProgress));
    assert_eq!(frames.borrow().len(), 5);
    assert_eq!(
        statuses.borrow().last().map(|s| s.to_string()),
        Some("Error: an export is already in progress".to_string())
    );

    let path = player.wait_for_export().expect("first export saved");
    assert_eq!(fs::read(&path).expect("read export").len(), 500);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn export_captures_every_prefix_with_floored_delay() {
    let dir = unique_temp_dir();
    let config = PlayerConfig {
        delay_ms: 5,
        output_dir: dir.clone(),
        ..PlayerConfig::default()
    };
    let factory = RecordingFactory::default();
    let frames = Rc::clone(&factory.frames);
    let statuses = Rc::default();
    let mut player = player_with(config, &statuses).with_encoder(factory);
    let transitions = Rc::new(RefCell::new(Vec::new()));
    let listener = Rc::clone(&transitions);
    player.set_playback_listener(move |playing| listener.borrow_mut().push(playing));

    player.load_log(scenario());
    player.toggle_playback(Instant::now());
    player.export_all().expect("export starts");

    assert!(!player.is_playing());
    assert_eq!(*transitions.borrow(), vec![true, false]);
    assert_eq!(player.cursor(), player.len());
    assert_eq!(player.state(), PlaybackState::Finished);

    let canvas = SurfaceSize::new(800, 800).rgba_len();
    assert_eq!(*frames.borrow(), vec![(canvas, 50); 5]);

    let path = player.wait_for_export().expect("export saved");
    assert!(!player.is_exporting());
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .expect("utf-8 file name")
        .to_string();
    assert!(name.starts_with("maze-3x3-") && name.ends_with(".gif"), "{name}");
    assert_eq!(fs::read(&path).expect("read export").len(), 500);

    let lines: Vec<String> = statuses.borrow().iter().map(|s| s.to_string()).collect();
    let tail = &lines[lines.len() - 4..];
    assert_eq!(tail[0], "Frame 1/5");
    assert_eq!(tail[1], "Frame 5/5");
    assert_eq!(tail[2], "Encoding GIF...");
    assert!(tail[3].starts_with("GIF exported: maze-3x3-"));
    assert!(tail[3].ends_with("(0.5 KB)"));
    assert!(lines.contains(&"Preparing GIF export...".to_string()));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn capture_failure_is_reported_not_raised() {
    let statuses = Rc::default();
    let factory = RecordingFactory {
        fail_on_frame: Some(2),
        ..RecordingFactory::default()
    };
    let mut player = player_with(PlayerConfig::default(), &statuses).with_encoder(factory);
    player.load_log(scenario());

    player.export_all().expect("failures go to the status sink");
    assert!(!player.is_exporting());
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(
        statuses.borrow().last().map(|s| s.to_string()),
        Some("Error: encoding failed: disk full".to_string())
    );
}

#[test]
fn gif_export_writes_an_animated_gif() {
    let dir = unique_temp_dir();
    let config = PlayerConfig {
        output_dir: dir.clone(),
        ..PlayerConfig::default()
    };
    let statuses = Rc::default();
    let mut player = player_with(config, &statuses).with_encoder(GifEncoderFactory);
    player.load_log(EventLog::new(
        GridSize::new(2, 2),
        Cell::new(0, 0),
        Cell::new(1, 1),
        vec![Event::activate(Cell::new(0, 0))],
    ));

    player.export_all().expect("export starts");
    let path = player.wait_for_export().expect("gif saved");
    let bytes = fs::read(&path).expect("read gif");
    assert!(bytes.starts_with(b"GIF89a"));

    let _ = fs::remove_dir_all(&dir);
}
