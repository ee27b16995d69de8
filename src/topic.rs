use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    /// The name of this topic.
    pub name: String,

    /// Partition information
    pub partitions: BTreeMap<i32, Partition>,
}

impl Topic {
    /// Number of partitions, saturating at `i32::MAX`.
    pub fn partition_count(&self) -> i32 {
        i32::try_from(self.partitions.len()).unwrap_or(i32::MAX)
    }

    /// Replica count of the lowest-numbered partition, or `0` for a topic without partitions.
    ///
    /// Topic shape checks only look at this partition.
    pub fn first_partition_replicas(&self) -> i16 {
        self.partitions
            .values()
            .next()
            .map(|p| i16::try_from(p.replica_nodes.len()).unwrap_or(i16::MAX))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Partition {
    /// The ID of the leader broker.
    pub leader_id: i32,

    /// The set of all nodes that host this partition.
    pub replica_nodes: Vec<i32>,

    /// The set of all nodes that are in sync with the leader for this partition.
    pub isr_nodes: Vec<i32>,
}

/// A topic creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopic {
    /// The topic name
    pub name: String,

    /// The number of partitions to create in the topic.
    pub num_partitions: i32,

    /// The number of replicas to create for each partition in the topic.
    pub replication_factor: i16,
}

impl NewTopic {
    pub fn new(name: impl Into<String>, num_partitions: i32, replication_factor: i16) -> Self {
        Self {
            name: name.into(),
            num_partitions,
            replication_factor,
        }
    }
}
