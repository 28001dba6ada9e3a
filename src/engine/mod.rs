pub mod clock;
pub mod io;
pub mod stage;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use io::{event_pipe, sample_pipe, ChannelReader, ChannelWriter, EventWriter, IoReader, IoWriter, SampleReader};
pub use stage::{ClassifierStage, FrequencyControl, StageHandle, StageReport};
pub use state::StageState;
