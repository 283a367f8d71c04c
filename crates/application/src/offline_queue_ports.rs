mod connectivity;
mod listener;
mod replay;
mod store;

pub use connectivity::Connectivity;
pub use listener::DroppedActionListener;
pub use replay::ActionReplayer;
pub use store::KeyValueStore;
