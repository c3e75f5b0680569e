//! Statistics about forest builds.

/// Statistics about a built forest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForestStats {
    /// Number of nodes in the forest.
    pub node_count: usize,
    /// Number of trees (nodes without a parent).
    pub root_count: usize,
    /// Number of nodes without children.
    pub leaf_count: usize,
    /// Depth of the deepest node, roots counting as 1.
    pub max_depth: u32,
    /// Average node depth.
    pub avg_depth: f64,
    /// Time taken to validate and index the edge list in milliseconds.
    pub build_time_ms: u64,
}

impl ForestStats {
    /// Returns the average number of nodes per tree.
    pub fn avg_tree_size(&self) -> f64 {
        if self.root_count == 0 {
            0.0
        } else {
            self.node_count as f64 / self.root_count as f64
        }
    }
}

impl std::fmt::Display for ForestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forest Statistics:")?;
        writeln!(f, "  Nodes:           {}", self.node_count)?;
        writeln!(f, "  Trees:           {}", self.root_count)?;
        writeln!(f, "  Leaves:          {}", self.leaf_count)?;
        writeln!(f, "  Max depth:       {}", self.max_depth)?;
        writeln!(f, "  Avg depth:       {:.1}", self.avg_depth)?;
        writeln!(f, "  Avg tree size:   {:.1}", self.avg_tree_size())?;
        writeln!(f, "  Build time:      {}ms", self.build_time_ms)?;
        Ok(())
    }
}
