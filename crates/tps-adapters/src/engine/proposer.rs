use async_trait::async_trait;
use log::debug;
use tps_core::{ArtifactRef, MoveProposer, Proposal, ProposalFailure, ProposalRequest};

use super::{Engine, EngineJob};

/// `MoveProposer` que delega en un `Engine` y lee la propuesta como JSON de
/// la última línea no vacía de stdout.
///
/// Si la propuesta no trae `artifact`, se usa el workdir del trabajo.
pub struct EngineProposer<E> {
    engine: E,
    kind: String,
}

impl<E: Engine> EngineProposer<E> {
    pub fn new(engine: E, kind: impl Into<String>) -> Self {
        Self { engine,
               kind: kind.into() }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

pub(crate) fn parse_proposal(stdout: &str) -> Result<Proposal, ProposalFailure> {
    let line = stdout.lines()
                     .rev()
                     .find(|l| !l.trim().is_empty())
                     .ok_or_else(|| ProposalFailure::InvalidOutput("empty engine output".into()))?;
    serde_json::from_str(line.trim()).map_err(|e| ProposalFailure::InvalidOutput(e.to_string()))
}

#[async_trait]
impl<E: Engine> MoveProposer for EngineProposer<E> {
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn propose(&self, request: ProposalRequest) -> Result<Proposal, ProposalFailure> {
        let input = serde_json::to_string(request.current.step()).map_err(|e| ProposalFailure::Proposer(e.to_string()))?;
        let job = EngineJob { chain_index: request.chain_index,
                              step_number: request.step_number,
                              input };
        let output = self.engine.run(job).await?;
        let mut proposal = parse_proposal(&output.stdout)?;
        if proposal.artifact.is_none() {
            proposal.artifact = Some(ArtifactRef::new(output.workdir.to_string_lossy()));
        }
        debug!("proposer:parsed chain={} step={} p={}",
               request.chain_index,
               request.step_number,
               proposal.acceptance_probability);
        Ok(proposal)
    }
}
