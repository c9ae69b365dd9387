/// Cache key for the chart served at `/api/music/nepalese`.
pub const NEPALESE_CHART_KEY: &str = "deezer_music_data_nepalese";
