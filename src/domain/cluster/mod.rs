pub mod node_range;
pub mod pxe;
pub mod resolver;
pub mod topology;
