pub mod error;
pub mod name;
pub mod sanitize;
pub mod fs;
pub mod packet;
pub mod properties;
pub mod sort;

pub use error::{PacketError, Result};
pub use name::{decompose, NameParts};
pub use sanitize::{is_troublesome, rename_troublesome, sanitize_name};
pub use fs::{AsyncPacketFs, LocalFs, PacketFs};
pub use packet::{list_members, list_members_async, list_packets, list_packets_async, rename_packet, rename_packet_async, NameMatch, Packet, PacketFilter};
pub use properties::{Properties, PropertiesCache, PropertyStore, StoreOptions};
pub use sort::{sort, sort_async, sort_by_key, sort_by_key_async, IndexCriterion, IndexOrder, PropertyCriterion, PropertyKind, PropertyOrder};
