pub mod targets {
    pub const SEARCH: &str = "search";
    pub const PROPAGATION: &str = "propagation";
    pub const BRANCH: &str = "branch";
    pub const GRID: &str = "grid";
    pub const DIMACS: &str = "dimacs";
    pub const BACKEND: &str = "backend";
}
