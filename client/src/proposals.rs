//! Proposal listing and results.

use ballot_contract::{ProposalRecord, VotingContract};
use ballot_types::{Candidate, CandidateId, ProposalTally, WinningProposal};
use tracing::debug;

use crate::error::ClientError;

/// Decode raw proposals, skipping empty names while the rest keep their contract index.
pub fn decode_proposals(records: &[ProposalRecord]) -> Vec<ProposalTally> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            Candidate::decode_name(&record.name).map(|name| ProposalTally {
                candidate: Candidate {
                    id: CandidateId::new(index as u64),
                    name,
                },
                votes: record.votes,
            })
        })
        .collect()
}

/// The ballot's candidates.
pub async fn candidates<C: VotingContract>(contract: &C) -> Result<Vec<Candidate>, ClientError> {
    Ok(results(contract)
        .await?
        .into_iter()
        .map(|tally| tally.candidate)
        .collect())
}

/// Every candidate with its current vote count.
pub async fn results<C: VotingContract>(contract: &C) -> Result<Vec<ProposalTally>, ClientError> {
    let records = contract.all_proposals().await?;
    let tallies = decode_proposals(&records);
    debug!(
        proposals = records.len(),
        named = tallies.len(),
        "loaded proposals"
    );
    Ok(tallies)
}

/// The leading proposal. The contract rejects this read until results are public.
pub async fn winner<C: VotingContract>(contract: &C) -> Result<WinningProposal, ClientError> {
    Ok(contract.winning_proposal().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, votes: u64) -> ProposalRecord {
        let mut raw = [0u8; 32];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        ProposalRecord { name: raw, votes }
    }

    #[test]
    fn empty_names_skipped_indices_kept() {
        let tallies = decode_proposals(&[record("Alice", 3), record("", 0), record("Carol", 1)]);
        assert_eq!(tallies.len(), 2);
        assert_eq!(tallies[0].candidate.id, CandidateId::new(0));
        assert_eq!(tallies[1].candidate.id, CandidateId::new(2));
        assert_eq!(tallies[1].candidate.name, "Carol");
        assert_eq!(tallies[1].votes, 1);
    }

    #[test]
    fn names_are_trimmed() {
        let tallies = decode_proposals(&[record("  Bob ", 0)]);
        assert_eq!(tallies[0].candidate.name, "Bob");
    }
}
