/// Application name
pub const APP_NAME: &str = "Lumina";

/// Storage key of the current artists collection
pub const ARTISTS_KEY: &str = "LUMINA_ARTISTS_DB";

/// Storage key older builds wrote artists under
pub const LEGACY_ARTISTS_KEY: &str = "artists";

/// Storage key of the venues collection
pub const VENUES_KEY: &str = "venues";

/// Storage key of the persisted session
pub const SESSION_KEY: &str = "LUMINA_SESSION";

/// Photos are scaled so their larger side never exceeds this (pixels)
pub const DEFAULT_MAX_PHOTO_DIMENSION: u32 = 1500;

/// JPEG quality used when re-encoding photos (0-100)
pub const PHOTO_JPEG_QUALITY: u8 = 90;

/// Capacity threshold used by the map filter bands
pub const CAPACITY_BAND_THRESHOLD: u32 = 100;

/// Default map center (Buenos Aires) as (lat, lng)
pub const DEFAULT_MAP_CENTER: (f64, f64) = (-34.6037, -58.3816);

/// Genres offered by the listing forms
pub const GENRES: &[&str] = &[
    "Rock",
    "Rock alternativo",
    "Metal",
    "Hard rock",
    "Indie",
    "Folk",
    "Country",
    "Pop",
    "Reaggueton",
    "Rap",
    "Trap",
    "Hip hop",
    "Musica tropical",
    "Tango",
    "Candombe",
    "Techno",
    "Instrumental",
    "Infantil",
    "Religiosa",
    "Milonga",
    "Canto popular",
    "Folklore",
];
