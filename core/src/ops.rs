use std::fmt;

use crate::cell::CellKey;

/// Delay before a confirmed delegate/revoke resets its mode UI, so the
/// success notification is visible first.
pub const MODE_RESET_DELAY_MS: u32 = 1_000;

/// How long after local confirmation the fallback reconciliation fires if
/// no chain event arrives.
pub const FALLBACK_DELAY_MS: u32 = 2_000;

/// The mutating operations the tracker watches. Batch mint and batch
/// update are separate kinds so notification text never has to guess which
/// flavor a confirmed batch was.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    Mint,
    Update,
    BatchMint,
    BatchUpdate,
    Compose,
    Delegate,
    Revoke,
}

/// What a notification template gets to interpolate.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpContext {
    pub cell: Option<CellKey>,
    pub count: usize,
}

impl OpContext {
    pub fn single(cell: CellKey) -> Self {
        Self {
            cell: Some(cell),
            count: 1,
        }
    }

    pub fn batch(count: usize) -> Self {
        Self { cell: None, count }
    }

    fn cell_label(&self) -> String {
        match self.cell {
            Some((x, y)) => format!("({x}, {y})"),
            None => "(?, ?)".to_string(),
        }
    }
}

impl OpKind {
    pub fn is_batch(self) -> bool {
        matches!(
            self,
            OpKind::BatchMint | OpKind::BatchUpdate | OpKind::Compose
        )
    }

    /// Delegate/revoke confirmations auto-close their mode UI after a short
    /// grace delay.
    pub fn resets_mode_ui(self) -> bool {
        matches!(self, OpKind::Delegate | OpKind::Revoke)
    }

    /// Mint/update paths consult fees and exemptions before submitting;
    /// delegation management does not.
    pub fn requires_fee_check(self) -> bool {
        matches!(
            self,
            OpKind::Mint | OpKind::Update | OpKind::BatchMint | OpKind::BatchUpdate
        )
    }

    pub fn submit_notice(self, ctx: &OpContext) -> (String, String) {
        let count = ctx.count;
        match self {
            OpKind::Mint => (
                "Mint Started".into(),
                format!("Minting pixel at {}...", ctx.cell_label()),
            ),
            OpKind::Update => (
                "Update Started".into(),
                format!("Updating pixel at {}...", ctx.cell_label()),
            ),
            OpKind::BatchMint => (
                "Batch Mint Started".into(),
                format!("Minting {count} pixels..."),
            ),
            OpKind::BatchUpdate => (
                "Batch Update Started".into(),
                format!("Updating {count} pixels..."),
            ),
            OpKind::Compose => (
                "Composition Started".into(),
                format!("Composing {count} pixels into NFT..."),
            ),
            OpKind::Delegate => (
                "Delegation Submitted".into(),
                format!("Delegating {count} pixels..."),
            ),
            OpKind::Revoke => (
                "Revocation Submitted".into(),
                format!("Revoking access for {count} pixels..."),
            ),
        }
    }

    pub fn success_notice(self, ctx: &OpContext) -> (String, String) {
        let count = ctx.count;
        match self {
            OpKind::Mint => (
                "Pixel Minted!".into(),
                format!("Successfully minted pixel at {}", ctx.cell_label()),
            ),
            OpKind::Update => (
                "Color Updated!".into(),
                format!("Successfully updated pixel at {}", ctx.cell_label()),
            ),
            OpKind::BatchMint => (
                "Batch Mint Complete!".into(),
                format!("Successfully minted {count} pixels!"),
            ),
            OpKind::BatchUpdate => (
                "Batch Update Complete!".into(),
                format!("Successfully updated {count} pixels!"),
            ),
            OpKind::Compose => (
                "Composition Complete!".into(),
                format!("Successfully composed {count} pixels into NFT!"),
            ),
            OpKind::Delegate => (
                "Delegation Complete!".into(),
                format!("Successfully delegated {count} pixels!"),
            ),
            OpKind::Revoke => (
                "Revocation Complete!".into(),
                format!("Successfully revoked access for {count} pixels!"),
            ),
        }
    }

    pub fn failure_notice(self, ctx: &OpContext) -> (String, String) {
        match self {
            OpKind::Mint => (
                "Mint Failed".into(),
                format!("Failed to mint pixel at {}", ctx.cell_label()),
            ),
            OpKind::Update => (
                "Update Failed".into(),
                format!("Failed to update pixel at {}", ctx.cell_label()),
            ),
            OpKind::BatchMint => (
                "Batch Mint Failed".into(),
                "Failed to submit batch mint transaction".into(),
            ),
            OpKind::BatchUpdate => (
                "Batch Update Failed".into(),
                "Failed to submit batch update transaction".into(),
            ),
            OpKind::Compose => (
                "Composition Failed".into(),
                "Failed to compose the selected pixels".into(),
            ),
            OpKind::Delegate => (
                "Delegation Failed".into(),
                "Failed to delegate pixels".into(),
            ),
            OpKind::Revoke => (
                "Revocation Failed".into(),
                "Failed to revoke pixel access".into(),
            ),
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OpKind::Mint => "mint",
            OpKind::Update => "update",
            OpKind::BatchMint => "batch-mint",
            OpKind::BatchUpdate => "batch-update",
            OpKind::Compose => "compose",
            OpKind::Delegate => "delegate",
            OpKind::Revoke => "revoke",
        };
        f.write_str(label)
    }
}

/// Best-effort human-readable reason for a failed submission, derived by
/// substring-matching the underlying error text.
pub fn failure_reason(raw: &str) -> Option<&'static str> {
    if raw.contains("User rejected") || raw.contains("user rejected") {
        return Some("Transaction rejected by user");
    }
    if raw.contains("insufficient funds") {
        return Some("Insufficient funds for fee");
    }
    if raw.contains("execution reverted") {
        return Some("Transaction reverted by contract");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_table_splits_kinds() {
        assert!(OpKind::Delegate.resets_mode_ui());
        assert!(OpKind::Revoke.resets_mode_ui());
        assert!(!OpKind::Mint.resets_mode_ui());
        assert!(OpKind::Mint.requires_fee_check());
        assert!(OpKind::BatchUpdate.requires_fee_check());
        assert!(!OpKind::Delegate.requires_fee_check());
        assert!(!OpKind::Compose.requires_fee_check());
    }

    #[test]
    fn messages_interpolate_cell_and_count() {
        let single = OpContext::single((10, 20));
        let (_, message) = OpKind::Mint.success_notice(&single);
        assert_eq!(message, "Successfully minted pixel at (10, 20)");
        let batch = OpContext::batch(3);
        let (_, message) = OpKind::BatchUpdate.success_notice(&batch);
        assert_eq!(message, "Successfully updated 3 pixels!");
    }

    #[test]
    fn maps_known_failure_text() {
        assert_eq!(
            failure_reason("RPC error: User rejected the request"),
            Some("Transaction rejected by user")
        );
        assert_eq!(failure_reason("something else entirely"), None);
    }
}
