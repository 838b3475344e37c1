// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error taxonomy for the rigging core.

use chainrig_scene::SceneError;

/// Error raised by rigging-core operations.
///
/// Validation failures are raised at the point of detection; there is no
/// local recovery. Construction sequences delete the nodes they created
/// before propagating, and the `cleanup_*_managers` sweeps reconcile any
/// drift left behind by the host.
#[derive(Debug, thiserror::Error)]
pub enum RigError {
    /// Joint set is not a valid single chain
    #[error("not a single joint chain: {0}")]
    Topology(String),

    /// Node name does not carry the manager prefix the operation expects
    #[error("node `{node}` is not a {expected} manager")]
    ManagerMismatch {
        /// Offending node name
        node: String,
        /// Expected manager kind (`bound`, `driver`, or `connector`)
        expected: &'static str,
    },

    /// Driver-output count differs from bound-input count
    #[error("driver output count {outputs} does not match bound input count {inputs}")]
    Cardinality {
        /// Number of driver outputs
        outputs: usize,
        /// Number of bound inputs
        inputs: usize,
    },

    /// Required attribute is absent on a target joint
    #[error("attribute `{attr}` does not exist on joint `{joint}`")]
    MissingAttribute {
        /// Joint name
        joint: String,
        /// Missing attribute name
        attr: String,
    },

    /// Every driver slot on the bound manager is occupied
    #[error("no free driver slot on manager `{manager}` (limit {limit})")]
    SlotExhaustion {
        /// Bound manager name
        manager: String,
        /// Configured slot ceiling
        limit: usize,
    },

    /// Driver chain constructed without joints
    #[error("a driver chain requires at least one joint")]
    EmptyChain,

    /// Connector index is outside the recorded plug list
    #[error("connector index {index} out of range (chain has {count} connectors)")]
    ConnectorOutOfRange {
        /// Requested index
        index: usize,
        /// Number of recorded connectors
        count: usize,
    },

    /// Manager node lacks a connection reconstruction depends on
    #[error("manager `{manager}` is missing its {missing} connection")]
    MissingLink {
        /// Manager node name
        manager: String,
        /// Human-readable description of the absent link
        missing: &'static str,
    },

    /// Underlying scene operation failed
    #[error(transparent)]
    Scene(#[from] SceneError),
}
