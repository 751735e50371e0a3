use crate::error::Result;
use crate::pipeline::EvaluationStore;
use async_trait::async_trait;
use scout_core::JobEvaluation;
use scout_db::{evaluations, Database, DatabaseError};

#[async_trait]
impl EvaluationStore for Database {
    async fn save_evaluation(&self, evaluation: &JobEvaluation) -> Result<()> {
        let mut tx = self.begin().await?;
        evaluations::upsert_evaluation(&mut tx, evaluation).await?;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }
}
