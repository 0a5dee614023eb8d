//! Decoder for the provider's compact contour encoding
//!
//! The provider ships precipitation and wind bands as coloured areas of
//! delta-encoded rings laid out on a Swiss-grid raster. This module turns such a
//! payload into a GeoJSON `FeatureCollection` in WGS84:
//!
//! 1. walk every ring's index deltas and sub-cell offsets to grid positions
//! 2. project grid positions to longitude/latitude ([`projection`])
//! 3. close, orient (counter-clockwise) and filter degenerate rings
//! 4. assemble rings into features band by band, lowest severity first
//!
//! Decoding is pure: the same payload always yields byte-identical output.
//!
//! ```rust,ignore
//! use weatherfusion::geometry::decode_bytes;
//!
//! let collection = decode_bytes(&body)?;
//! let json = serde_json::to_vec(&collection)?;
//! ```

mod decode;
mod error;
pub mod projection;
mod types;

pub use decode::{HOLE_COLOR, decode_bytes, decode_payload, decode_ring, signed_area};
pub use error::{DecodeError, Result};
pub use types::{
    Area, EncodedRing, Feature, FeatureCollection, FeatureProperties, Geometry, GridDescriptor,
    Polygon, Position, ProviderPayload, Ring,
};
