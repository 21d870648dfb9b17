#![doc(issue_tracker_base_url = "https://github.com/chainbound/bier-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub use bier_gen::*;
pub use bier_transport::*;
pub use bier_wire::{proto, BierHeader, BSL_256, ETHERTYPE_BIER, HEADER_LEN, NIBBLE_BIER};
