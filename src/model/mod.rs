pub mod cache;
pub mod labels;
pub mod mock;
pub mod traits;

pub use cache::{prepare_input, softmax, ModelCache, ModelState};
pub use labels::{LabelTable, SIG53_CLASSES, SIG53_MODES};
pub use traits::{is_available, DeviceSpec, IqTensor, ModelLoader, SignalModel, WindowClassifier};
