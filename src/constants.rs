pub mod files {

    pub const CATALOG: &str = "movies.json";

    pub const RUN_METADATA: &str = "metadata.json";

    pub const EPISODE_LIST: &str = "episodes.json";
}

pub mod services {

    pub const OMDB: &str = "omdb";

    pub const STREAMING: &str = "streaming";

    pub const SCRAPER: &str = "maximumfun";
}

pub mod limits {

    pub const MATCH_DETAILS_SHOWN: usize = 10;

    pub const ERROR_BODY_CHARS: usize = 200;
}
