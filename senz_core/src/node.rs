//! The source-node side of the codec contract.
//!
//! A codec never creates or drives nodes; it is bound to one at `init` time
//! and from then on only reads geometry/format off it and (for codecs that
//! care) watches for configuration changes. The traits here are the minimal
//! surface the codec layer consumes — the production graph that owns real
//! device nodes lives in the host framework.

use std::sync::{Arc, Mutex, RwLock};

use log::debug;

/// What a production node produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Device,
    Depth,
    Image,
    Ir,
    Audio,
}

/// Per-pixel layout of a map-producing node's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb24,
    Yuv422,
    Grayscale8,
    Grayscale16,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb24 => 3,
            PixelFormat::Yuv422 => 2,
            PixelFormat::Grayscale8 => 1,
            PixelFormat::Grayscale16 => 2,
        }
    }
}

/// Output resolution and rate of a map-producing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoMode {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Cropping window applied on top of the output mode. When enabled, frames
/// carry `x_size * y_size` pixels instead of the full resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cropping {
    pub enabled: bool,
    pub x_offset: u32,
    pub y_offset: u32,
    pub x_size: u32,
    pub y_size: u32,
}

impl Cropping {
    pub const fn disabled() -> Self {
        Cropping { enabled: false, x_offset: 0, y_offset: 0, x_size: 0, y_size: 0 }
    }
}

/// Callback invoked after a node's output mode or cropping changes.
///
/// The framework may fire this from whatever thread observed the change, so
/// watchers must be `Send + Sync` and must not assume they run on the thread
/// that calls `compress`/`decompress`.
pub type ConfigWatcher = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`SourceNode::watch_config`], used to unsubscribe.
pub type WatcherId = u64;

/// The data-producing component a codec is bound to.
///
/// Codecs only ever *read* this interface: current geometry, pixel format,
/// the device's maximum representable sample value (depth nodes only), the
/// cropping state, and change notifications.
pub trait SourceNode: Send + Sync {
    fn kind(&self) -> NodeKind;

    fn name(&self) -> &str;

    fn video_mode(&self) -> VideoMode;

    fn pixel_format(&self) -> PixelFormat;

    /// Largest sample value the device can produce. `Some` only for
    /// depth-producing nodes.
    fn max_sample_value(&self) -> Option<u16> {
        None
    }

    /// Current cropping window, or `None` when the node does not support
    /// the cropping capability at all.
    fn cropping(&self) -> Option<Cropping> {
        None
    }

    /// Register for output-mode and cropping change notifications.
    fn watch_config(&self, watcher: ConfigWatcher) -> WatcherId;

    /// Drop a previously registered watcher. Unknown ids are ignored.
    fn unwatch_config(&self, id: WatcherId);
}

// ── ManualNode ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct NodeConfig {
    mode: VideoMode,
    format: PixelFormat,
    max_sample_value: Option<u16>,
    cropping: Option<Cropping>,
}

struct WatcherTable {
    next_id: WatcherId,
    entries: Vec<(WatcherId, ConfigWatcher)>,
}

/// A [`SourceNode`] whose configuration is supplied by the host instead of
/// read off a physical device. Playback, tooling, and tests run against one
/// of these (the CLI uses it to describe the geometry of a raw frame file).
///
/// Setters publish the complete new configuration first and fire watchers
/// after, so a watcher re-reading the node always sees a consistent state.
pub struct ManualNode {
    kind: NodeKind,
    name: String,
    config: RwLock<NodeConfig>,
    watchers: Mutex<WatcherTable>,
}

impl ManualNode {
    /// A depth-producing node: `Grayscale16` samples bounded by `max_value`.
    pub fn depth(name: &str, mode: VideoMode, max_value: u16) -> Arc<Self> {
        Arc::new(ManualNode {
            kind: NodeKind::Depth,
            name: name.to_string(),
            config: RwLock::new(NodeConfig {
                mode,
                format: PixelFormat::Grayscale16,
                max_sample_value: Some(max_value),
                cropping: Some(Cropping::disabled()),
            }),
            watchers: Mutex::new(WatcherTable { next_id: 1, entries: Vec::new() }),
        })
    }

    /// An image-producing node with the given pixel format.
    pub fn image(name: &str, mode: VideoMode, format: PixelFormat) -> Arc<Self> {
        Arc::new(ManualNode {
            kind: NodeKind::Image,
            name: name.to_string(),
            config: RwLock::new(NodeConfig {
                mode,
                format,
                max_sample_value: None,
                cropping: Some(Cropping::disabled()),
            }),
            watchers: Mutex::new(WatcherTable { next_id: 1, entries: Vec::new() }),
        })
    }

    /// A node of an arbitrary kind, for hosts that model other producers.
    pub fn with_kind(kind: NodeKind, name: &str, mode: VideoMode, format: PixelFormat) -> Arc<Self> {
        Arc::new(ManualNode {
            kind,
            name: name.to_string(),
            config: RwLock::new(NodeConfig { mode, format, max_sample_value: None, cropping: None }),
            watchers: Mutex::new(WatcherTable { next_id: 1, entries: Vec::new() }),
        })
    }

    pub fn set_video_mode(&self, mode: VideoMode) {
        self.config.write().expect("node config lock poisoned").mode = mode;
        self.notify();
    }

    pub fn set_pixel_format(&self, format: PixelFormat) {
        self.config.write().expect("node config lock poisoned").format = format;
        self.notify();
    }

    pub fn set_cropping(&self, cropping: Option<Cropping>) {
        self.config.write().expect("node config lock poisoned").cropping = cropping;
        self.notify();
    }

    /// Fire every registered watcher. Watchers are cloned out first so a
    /// callback may freely re-read (or even re-subscribe to) the node.
    fn notify(&self) {
        let snapshot: Vec<ConfigWatcher> = {
            let table = self.watchers.lock().expect("watcher lock poisoned");
            table.entries.iter().map(|(_, w)| Arc::clone(w)).collect()
        };
        debug!("node '{}': notifying {} config watcher(s)", self.name, snapshot.len());
        for watcher in snapshot {
            watcher();
        }
    }
}

impl SourceNode for ManualNode {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn video_mode(&self) -> VideoMode {
        self.config.read().expect("node config lock poisoned").mode
    }

    fn pixel_format(&self) -> PixelFormat {
        self.config.read().expect("node config lock poisoned").format
    }

    fn max_sample_value(&self) -> Option<u16> {
        self.config.read().expect("node config lock poisoned").max_sample_value
    }

    fn cropping(&self) -> Option<Cropping> {
        self.config.read().expect("node config lock poisoned").cropping
    }

    fn watch_config(&self, watcher: ConfigWatcher) -> WatcherId {
        let mut table = self.watchers.lock().expect("watcher lock poisoned");
        let id = table.next_id;
        table.next_id += 1;
        table.entries.push((id, watcher));
        id
    }

    fn unwatch_config(&self, id: WatcherId) {
        let mut table = self.watchers.lock().expect("watcher lock poisoned");
        table.entries.retain(|(wid, _)| *wid != id);
    }
}
