use crate::db::models::{
    CleanupStats, DailyRevenue, DbAgent, DbAgentWithMeetings, DbMeeting, DbMeetingDetail, DbOrder,
    DbPayment, DbUser, PaymentStatus, SessionUser, StatusCurrencyTotal, StatusShare, UpsertOutcome,
    UserStats,
};
use crate::db::patch::{
    AgentCreate, DateRange, EntityPatch, MeetingCreate, OrderCreate, PaymentCreate, PaymentFilter,
    PaymentWindow, PolarKey, PolarPaymentUpsert, SessionCreate, UserCreate,
};
use crate::db::patch_impl::DbPatchable;
use crate::db::schema::SQLITE_INIT;
use crate::db::{aggregates, meetings, orders, payments, reconcile, users};
use crate::error::MeetmindError;
use chrono::{DateTime, Utc};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::info;

type Reply<T> = RpcReplyPort<Result<T, MeetmindError>>;

#[derive(Debug)]
pub enum DbActorMessage {
    /// Apply a partial update; replies with the number of rows touched.
    Patch(EntityPatch, Reply<u64>),

    ListUsers(Option<String>, Reply<Vec<DbUser>>),
    UserStats(Reply<UserStats>),
    GetUser(String, Reply<Option<DbUser>>),
    CreateUser(UserCreate, Reply<DbUser>),
    DeleteUser(String, Reply<bool>),

    /// Create a session row and return its id.
    CreateSession(SessionCreate, Reply<String>),
    /// Resolve an unexpired session token to its user.
    ResolveSession(String, Reply<Option<SessionUser>>),

    ListAgents(String, Reply<Vec<DbAgentWithMeetings>>),
    CreateAgent(AgentCreate, Reply<DbAgent>),
    ListMeetings(String, Reply<Vec<DbMeetingDetail>>),
    /// `None` when the agent is not owned by the user.
    CreateMeeting(MeetingCreate, Reply<Option<DbMeeting>>),

    /// Orders newest first, optionally only those created at or after the instant.
    ListOrders(Option<DateTime<Utc>>, Reply<Vec<DbOrder>>),
    GetOrder(String, Reply<Option<DbOrder>>),
    CreateOrders(Vec<OrderCreate>, Reply<Vec<DbOrder>>),
    DeleteOrder(String, Reply<bool>),

    ListPayments(PaymentFilter, Reply<(Vec<DbPayment>, i64)>),
    GetPayment(String, Reply<Option<DbPayment>>),
    CreatePayment(PaymentCreate, Reply<DbPayment>),
    DeletePayment(String, Reply<bool>),
    LoadPayments(PaymentWindow, Reply<Vec<DbPayment>>),

    UpsertPolarPayment(PolarPaymentUpsert, Reply<UpsertOutcome>),
    CreateFromWebhook(PolarKey, PaymentCreate, Reply<UpsertOutcome>),
    SetStatusByPolarId(String, PaymentStatus, Reply<UpsertOutcome>),
    CleanupDuplicates(Reply<CleanupStats>),

    StatusCurrencyTotals(Option<DateRange>, Reply<Vec<StatusCurrencyTotal>>),
    DailyRevenue(Option<DateRange>, Reply<Vec<DailyRevenue>>),
    StatusShares(Option<DateRange>, Reply<Vec<StatusShare>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

fn rpc_failed<E: std::fmt::Display>(op: &'static str) -> impl FnOnce(E) -> MeetmindError {
    move |e| MeetmindError::RactorError(format!("DbActor {op} RPC failed: {e}"))
}

impl DbActorHandle {
    pub async fn patch(&self, patch: EntityPatch) -> Result<u64, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::Patch, patch).map_err(rpc_failed("Patch"))?
    }

    pub async fn list_users(&self, search: Option<String>) -> Result<Vec<DbUser>, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::ListUsers, search)
            .map_err(rpc_failed("ListUsers"))?
    }

    pub async fn user_stats(&self) -> Result<UserStats, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::UserStats).map_err(rpc_failed("UserStats"))?
    }

    pub async fn get_user(&self, id: String) -> Result<Option<DbUser>, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::GetUser, id).map_err(rpc_failed("GetUser"))?
    }

    pub async fn create_user(&self, create: UserCreate) -> Result<DbUser, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::CreateUser, create)
            .map_err(rpc_failed("CreateUser"))?
    }

    pub async fn delete_user(&self, id: String) -> Result<bool, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::DeleteUser, id).map_err(rpc_failed("DeleteUser"))?
    }

    pub async fn create_session(&self, create: SessionCreate) -> Result<String, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::CreateSession, create)
            .map_err(rpc_failed("CreateSession"))?
    }

    pub async fn resolve_session(
        &self,
        token: String,
    ) -> Result<Option<SessionUser>, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::ResolveSession, token)
            .map_err(rpc_failed("ResolveSession"))?
    }

    pub async fn list_agents(
        &self,
        user_id: String,
    ) -> Result<Vec<DbAgentWithMeetings>, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::ListAgents, user_id)
            .map_err(rpc_failed("ListAgents"))?
    }

    pub async fn create_agent(&self, create: AgentCreate) -> Result<DbAgent, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::CreateAgent, create)
            .map_err(rpc_failed("CreateAgent"))?
    }

    pub async fn list_meetings(
        &self,
        user_id: String,
    ) -> Result<Vec<DbMeetingDetail>, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::ListMeetings, user_id)
            .map_err(rpc_failed("ListMeetings"))?
    }

    pub async fn create_meeting(
        &self,
        create: MeetingCreate,
    ) -> Result<Option<DbMeeting>, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::CreateMeeting, create)
            .map_err(rpc_failed("CreateMeeting"))?
    }

    pub async fn list_orders(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<DbOrder>, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::ListOrders, since)
            .map_err(rpc_failed("ListOrders"))?
    }

    pub async fn get_order(&self, id: String) -> Result<Option<DbOrder>, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::GetOrder, id).map_err(rpc_failed("GetOrder"))?
    }

    pub async fn create_orders(
        &self,
        creates: Vec<OrderCreate>,
    ) -> Result<Vec<DbOrder>, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::CreateOrders, creates)
            .map_err(rpc_failed("CreateOrders"))?
    }

    pub async fn delete_order(&self, id: String) -> Result<bool, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::DeleteOrder, id)
            .map_err(rpc_failed("DeleteOrder"))?
    }

    pub async fn list_payments(
        &self,
        filter: PaymentFilter,
    ) -> Result<(Vec<DbPayment>, i64), MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::ListPayments, filter)
            .map_err(rpc_failed("ListPayments"))?
    }

    pub async fn get_payment(&self, id: String) -> Result<Option<DbPayment>, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::GetPayment, id).map_err(rpc_failed("GetPayment"))?
    }

    pub async fn create_payment(&self, create: PaymentCreate) -> Result<DbPayment, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::CreatePayment, create)
            .map_err(rpc_failed("CreatePayment"))?
    }

    pub async fn delete_payment(&self, id: String) -> Result<bool, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::DeletePayment, id)
            .map_err(rpc_failed("DeletePayment"))?
    }

    pub async fn load_payments(
        &self,
        window: PaymentWindow,
    ) -> Result<Vec<DbPayment>, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::LoadPayments, window)
            .map_err(rpc_failed("LoadPayments"))?
    }

    pub async fn upsert_polar_payment(
        &self,
        up: PolarPaymentUpsert,
    ) -> Result<UpsertOutcome, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::UpsertPolarPayment, up)
            .map_err(rpc_failed("UpsertPolarPayment"))?
    }

    pub async fn create_from_webhook(
        &self,
        key: PolarKey,
        create: PaymentCreate,
    ) -> Result<UpsertOutcome, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::CreateFromWebhook, key, create)
            .map_err(rpc_failed("CreateFromWebhook"))?
    }

    pub async fn set_status_by_polar_id(
        &self,
        polar_id: String,
        status: PaymentStatus,
    ) -> Result<UpsertOutcome, MeetmindError> {
        ractor::call!(
            self.actor,
            DbActorMessage::SetStatusByPolarId,
            polar_id,
            status
        )
        .map_err(rpc_failed("SetStatusByPolarId"))?
    }

    pub async fn cleanup_duplicates(&self) -> Result<CleanupStats, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::CleanupDuplicates)
            .map_err(rpc_failed("CleanupDuplicates"))?
    }

    pub async fn status_currency_totals(
        &self,
        range: Option<DateRange>,
    ) -> Result<Vec<StatusCurrencyTotal>, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::StatusCurrencyTotals, range)
            .map_err(rpc_failed("StatusCurrencyTotals"))?
    }

    pub async fn daily_revenue(
        &self,
        range: Option<DateRange>,
    ) -> Result<Vec<DailyRevenue>, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::DailyRevenue, range)
            .map_err(rpc_failed("DailyRevenue"))?
    }

    pub async fn status_shares(
        &self,
        range: Option<DateRange>,
    ) -> Result<Vec<StatusShare>, MeetmindError> {
        ractor::call!(self.actor, DbActorMessage::StatusShares, range)
            .map_err(rpc_failed("StatusShares"))?
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let pool = &state.pool;
        match message {
            DbActorMessage::Patch(patch, reply) => {
                let _ = reply.send(patch.apply_patch(pool).await);
            }
            DbActorMessage::ListUsers(search, reply) => {
                let _ = reply.send(users::list(pool, search).await);
            }
            DbActorMessage::UserStats(reply) => {
                let _ = reply.send(users::stats(pool).await);
            }
            DbActorMessage::GetUser(id, reply) => {
                let _ = reply.send(users::get(pool, &id).await);
            }
            DbActorMessage::CreateUser(create, reply) => {
                let _ = reply.send(users::create(pool, create).await);
            }
            DbActorMessage::DeleteUser(id, reply) => {
                let _ = reply.send(users::delete(pool, &id).await);
            }
            DbActorMessage::CreateSession(create, reply) => {
                let _ = reply.send(users::create_session(pool, create).await);
            }
            DbActorMessage::ResolveSession(token, reply) => {
                let _ = reply.send(users::resolve_session(pool, &token).await);
            }
            DbActorMessage::ListAgents(user_id, reply) => {
                let _ = reply.send(meetings::list_agents(pool, &user_id).await);
            }
            DbActorMessage::CreateAgent(create, reply) => {
                let _ = reply.send(meetings::create_agent(pool, create).await);
            }
            DbActorMessage::ListMeetings(user_id, reply) => {
                let _ = reply.send(meetings::list_meetings(pool, &user_id).await);
            }
            DbActorMessage::CreateMeeting(create, reply) => {
                let _ = reply.send(meetings::create_meeting(pool, create).await);
            }
            DbActorMessage::ListOrders(since, reply) => {
                let _ = reply.send(orders::list(pool, since).await);
            }
            DbActorMessage::GetOrder(id, reply) => {
                let _ = reply.send(orders::get(pool, &id).await);
            }
            DbActorMessage::CreateOrders(creates, reply) => {
                let _ = reply.send(orders::create_many(pool, creates).await);
            }
            DbActorMessage::DeleteOrder(id, reply) => {
                let _ = reply.send(orders::delete(pool, &id).await);
            }
            DbActorMessage::ListPayments(filter, reply) => {
                let _ = reply.send(payments::list(pool, filter).await);
            }
            DbActorMessage::GetPayment(id, reply) => {
                let _ = reply.send(payments::get(pool, &id).await);
            }
            DbActorMessage::CreatePayment(create, reply) => {
                let res = match pool.acquire().await {
                    Ok(mut conn) => payments::insert(&mut *conn, create).await,
                    Err(e) => Err(e.into()),
                };
                let _ = reply.send(res);
            }
            DbActorMessage::DeletePayment(id, reply) => {
                let _ = reply.send(payments::delete(pool, &id).await);
            }
            DbActorMessage::LoadPayments(window, reply) => {
                let _ = reply.send(payments::load(pool, window).await);
            }
            DbActorMessage::UpsertPolarPayment(up, reply) => {
                let _ = reply.send(reconcile::upsert_polar_payment(pool, up).await);
            }
            DbActorMessage::CreateFromWebhook(key, create, reply) => {
                let _ = reply.send(reconcile::create_from_webhook(pool, key, create).await);
            }
            DbActorMessage::SetStatusByPolarId(polar_id, status, reply) => {
                let res = reconcile::set_status_by_polar_id(pool, &polar_id, status).await;
                let _ = reply.send(res);
            }
            DbActorMessage::CleanupDuplicates(reply) => {
                let _ = reply.send(reconcile::cleanup_duplicates(pool).await);
            }
            DbActorMessage::StatusCurrencyTotals(range, reply) => {
                let _ = reply.send(aggregates::status_currency_totals(pool, range).await);
            }
            DbActorMessage::DailyRevenue(range, reply) => {
                let _ = reply.send(aggregates::daily_revenue(pool, range).await);
            }
            DbActorMessage::StatusShares(range, reply) => {
                let _ = reply.send(aggregates::status_shares(pool, range).await);
            }
        }
        Ok(())
    }
}

/// Spawn the database actor and return a cloneable handle.
///
/// The actor is unnamed so several databases can coexist in one process.
pub async fn spawn(database_url: &str) -> Result<DbActorHandle, MeetmindError> {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .map_err(|e| MeetmindError::RactorError(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), MeetmindError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_splits_into_complete_statements() {
        let stmts: Vec<&str> = SQLITE_INIT
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        assert!(stmts.iter().all(|s| {
            let body = s
                .lines()
                .filter(|l| !l.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n");
            body.contains("CREATE TABLE") || body.contains("CREATE INDEX")
        }));
        assert!(stmts.iter().any(|s| s.contains("CREATE TABLE IF NOT EXISTS payments")));
    }
}
