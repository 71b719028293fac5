use crate::error::{Error, Result};

/// Naming scheme of the cluster: node `i` of the grid is called `prefix` followed by
/// `start + i`, zero padded to `pad_len` digits (`kn001`, `kn002`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterTopology {
    prefix: String,
    start: usize,
    end: usize,
    pad_len: usize,
}

impl ClusterTopology {
    pub fn new(prefix: impl Into<String>, start: usize, end: usize, pad_len: usize) -> Result<Self> {
        if start > end {
            return Err(Error::ConfigError(format!("cluster start {} is greater than cluster end {}", start, end)));
        }

        Ok(ClusterTopology { prefix: prefix.into(), start, end, pad_len })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn pad_len(&self) -> usize {
        self.pad_len
    }

    /// Number of nodes in the cluster, i.e. the length of every occupancy vector.
    pub fn node_count(&self) -> usize {
        self.end - self.start + 1
    }

    /// Formats the node number (not the grid index) with prefix and padding.
    pub fn format_number(&self, number: usize) -> String {
        format!("{}{:0width$}", self.prefix, number, width = self.pad_len)
    }

    /// Name of the node at grid index `index`.
    pub fn node_name(&self, index: usize) -> String {
        self.format_number(self.start + index)
    }

    /// Checks that a node number lies inside `start..=end` and maps it to its grid index.
    pub fn number_to_index(&self, number: usize) -> Result<usize> {
        if number < self.start || number > self.end {
            return Err(Error::InvalidRequest(format!(
                "node number {} is outside of the cluster range {}..={}",
                number, self.start, self.end
            )));
        }

        Ok(number - self.start)
    }

    /// Translates a host name back into its grid index.
    pub fn node_index(&self, host: &str) -> Result<usize> {
        let digits = host.strip_prefix(self.prefix.as_str()).ok_or_else(|| Error::InvalidRequest(format!("invalid hostname {}", host)))?;

        let number: usize = digits.parse().map_err(|_| Error::InvalidRequest(format!("invalid hostname {}", host)))?;

        self.number_to_index(number).map_err(|_| Error::InvalidRequest(format!("invalid hostname {}: not part of the cluster", host)))
    }

    /// Translates every host name, preserving order.
    pub fn node_indices(&self, hosts: &[String]) -> Result<Vec<usize>> {
        hosts.iter().map(|host| self.node_index(host)).collect()
    }

    pub fn node_names(&self, indices: &[usize]) -> Vec<String> {
        indices.iter().map(|index| self.node_name(*index)).collect()
    }
}
