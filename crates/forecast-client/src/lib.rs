//! Forecast retrieval and viewer state for the sargassum viewer.
//!
//! - [`transport`]: the forecast API behind a trait, with a reqwest implementation
//! - [`payload`]: decoding of volume and point-sample bodies
//! - [`coordinator`]: cancel-and-replace series slots and the heatmap guard
//! - [`session`]: selection, threshold, date, datasets and grid of one view
//! - [`chart`]: datasets handed to the chart collaborator
//! - [`animation`]: play/pause over the forecast window

pub mod animation;
pub mod chart;
pub mod coordinator;
pub mod error;
pub mod payload;
pub mod session;
pub mod transport;

pub use animation::{PlaybackEnd, PlaybackSettings, PlaybackState, Player};
pub use chart::{ChartPayload, DatasetPayload};
pub use coordinator::{FetchOutcome, ForecastFetchCoordinator, SeriesSlot, SlotState};
pub use error::{FetchError, FetchResult};
pub use session::{
    HeatmapLayer, SessionSettings, SessionSnapshot, ViewerSession, DEFAULT_THRESHOLD,
};
pub use transport::{ForecastTransport, HttpTransport};
