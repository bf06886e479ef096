pub mod candidate;
pub mod filter_spec;
pub mod narrative;
pub mod selection;
pub mod travel;
pub mod weather;

pub use candidate::{ApiPlace, Candidate, FeasibilityScore, ScoredCandidate};
pub use filter_spec::{Bucket, EnergyLevel, FilterSpec, SettingPreference, TimeOfDay};
pub use narrative::{Blurb, CurationNarrative, NarrativeCluster};
pub use selection::{Guardrail, SelectionResult};
pub use travel::{GeoPoint, RegionHub, TravelPolicy};
pub use weather::{Forecast, WeatherSuitability};
