// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Persistence over the per-process SQLite store.
//!
//! Every write is an idempotent upsert keyed by `id`; persistence is lossy
//! by contract on a crash between flushes, and no step ever fails because
//! the store did.

use chrono::Utc;
use sqlx::Row;

use crate::domain::agent::AgentState;
use crate::domain::collective::CollectiveMemory;
use crate::domain::decision::Decision;
use crate::domain::signal::Signal;
use crate::domain::thought::Thought;
use crate::infrastructure::db::Database;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[derive(Clone)]
pub struct StateStore {
    db: Database,
}

impl StateStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn save_agent(&self, state: &AgentState) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(state)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO agents (id, name, state_json, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                state_json = excluded.state_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&state.id)
        .bind(&state.name)
        .bind(json)
        .bind(Utc::now().to_rfc3339())
        .execute(self.db.pool())
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn load_agent(&self, id: &str) -> Result<Option<AgentState>, RepositoryError> {
        let row = sqlx::query("SELECT state_json FROM agents WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        match row {
            Some(row) => {
                let json: String = row
                    .try_get("state_json")
                    .map_err(|e| RepositoryError::Database(e.to_string()))?;
                let state = serde_json::from_str(&json)
                    .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    pub async fn save_thought(&self, agent_id: &str, thought: &Thought) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(thought)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO thoughts (id, agent_id, thought_json, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET thought_json = excluded.thought_json
            "#,
        )
        .bind(&thought.id)
        .bind(agent_id)
        .bind(json)
        .bind(Utc::now().to_rfc3339())
        .execute(self.db.pool())
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn save_decision(&self, agent_id: &str, decision: &Decision) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(decision)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO decisions (id, agent_id, decision_json, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET decision_json = excluded.decision_json
            "#,
        )
        .bind(&decision.id)
        .bind(agent_id)
        .bind(json)
        .bind(Utc::now().to_rfc3339())
        .execute(self.db.pool())
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn save_pheromones(&self, signals: &[Signal]) -> Result<(), RepositoryError> {
        for signal in signals {
            let json = serde_json::to_string(signal)
                .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
            sqlx::query(
                r#"
                INSERT INTO pheromones (id, signal_json, strength, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    signal_json = excluded.signal_json,
                    strength = excluded.strength,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&signal.id)
            .bind(json)
            .bind(signal.strength)
            .bind(Utc::now().to_rfc3339())
            .execute(self.db.pool())
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        }
        Ok(())
    }

    pub async fn save_collective_memory(&self, memory: &CollectiveMemory) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(memory)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO collective_memories (id, memory_json, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&memory.id)
        .bind(json)
        .bind(Utc::now().to_rfc3339())
        .execute(self.db.pool())
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn load_collective_memories(&self) -> Result<Vec<CollectiveMemory>, RepositoryError> {
        let rows = sqlx::query("SELECT memory_json FROM collective_memories ORDER BY created_at")
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        let mut memories = Vec::with_capacity(rows.len());
        for row in rows {
            let json: String = row
                .try_get("memory_json")
                .map_err(|e| RepositoryError::Database(e.to_string()))?;
            memories.push(
                serde_json::from_str(&json)
                    .map_err(|e| RepositoryError::Serialization(e.to_string()))?,
            );
        }
        Ok(memories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credits::CreditLedger;
    use crate::domain::personality::{AgentPersonality, AgentRole};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    async fn store() -> StateStore {
        StateStore::new(Database::open_in_memory().await.unwrap())
    }

    fn agent_state() -> AgentState {
        let mut rng = StdRng::seed_from_u64(21);
        AgentState::new(
            "agent-0",
            "hive-scout-0",
            AgentRole::Scout.specialization(),
            AgentPersonality::seeded(AgentRole::Scout, &mut rng),
            50_000,
            CreditLedger::new(50_000.0, 10_000.0, 2_000.0),
            &mut rng,
        )
    }

    #[tokio::test]
    async fn test_agent_roundtrip_is_idempotent() {
        let store = store().await;
        let mut state = agent_state();

        store.save_agent(&state).await.unwrap();
        state.step_count = 17;
        store.save_agent(&state).await.unwrap();

        let loaded = store.load_agent("agent-0").await.unwrap().unwrap();
        assert_eq!(loaded.step_count, 17);
        assert_eq!(loaded.name, "hive-scout-0");
        assert!(store.load_agent("agent-9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pheromone_upsert_dedups_by_id() {
        let store = store().await;
        let mut s = Signal::new("p", "content", "exoplanets", 0.8, 0.7, vec![], 0);
        s.id = "fixed".into();

        store.save_pheromones(std::slice::from_ref(&s)).await.unwrap();
        s.strength = 0.4;
        store.save_pheromones(std::slice::from_ref(&s)).await.unwrap();

        let row = sqlx::query("SELECT COUNT(*) AS n, MIN(strength) AS s FROM pheromones")
            .fetch_one(store.db.pool())
            .await
            .unwrap();
        let n: i64 = row.try_get("n").unwrap();
        let strength: f64 = row.try_get("s").unwrap();
        assert_eq!(n, 1);
        assert!((strength - 0.4).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_collective_memories_survive_reload() {
        let store = store().await;
        let memory = CollectiveMemory {
            id: "m1".into(),
            topic: "solar_flares".into(),
            synthesis: "joint view".into(),
            contributors: vec!["agent-0".into(), "agent-1".into()],
            signal_ids: vec!["s1".into()],
            confidence: 0.8,
            attestation: "ed25519:aa:bb".into(),
            created_at: 1,
            report: None,
        };
        store.save_collective_memory(&memory).await.unwrap();
        store.save_collective_memory(&memory).await.unwrap();

        let loaded = store.load_collective_memories().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].topic, "solar_flares");
    }
}
