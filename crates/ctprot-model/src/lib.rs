pub mod entry;
pub mod profile;
pub mod protocol;
pub mod render;
pub mod value;

pub use entry::Entry;
pub use profile::{BasicSection, EntryKind, VendorProfile};
pub use protocol::{Protocol, ProtocolPair};
pub use render::{RenderOp, SectionStyle, Slot, last_row};
pub use value::CellValue;
