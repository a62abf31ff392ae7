use crate::domain::models::ticket::TicketType;
use crate::domain::ports::TicketTypeRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteTicketRepo {
    pool: SqlitePool,
}

impl SqliteTicketRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketTypeRepository for SqliteTicketRepo {
    async fn create(&self, ticket: &TicketType) -> Result<TicketType, AppError> {
        sqlx::query_as::<_, TicketType>(
            "INSERT INTO ticket_types (id, key, name, price, is_enabled, sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&ticket.id).bind(&ticket.key).bind(&ticket.name).bind(ticket.price)
            .bind(ticket.is_enabled).bind(ticket.sort_order).bind(ticket.created_at).bind(ticket.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<TicketType>, AppError> {
        sqlx::query_as::<_, TicketType>("SELECT * FROM ticket_types WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_key(&self, key: &str) -> Result<Option<TicketType>, AppError> {
        sqlx::query_as::<_, TicketType>("SELECT * FROM ticket_types WHERE key = ?").bind(key).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list(&self, include_disabled: bool) -> Result<Vec<TicketType>, AppError> {
        let query = if include_disabled {
            "SELECT * FROM ticket_types ORDER BY sort_order ASC"
        } else {
            "SELECT * FROM ticket_types WHERE is_enabled = 1 ORDER BY sort_order ASC"
        };
        sqlx::query_as::<_, TicketType>(query).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update(&self, ticket: &TicketType) -> Result<TicketType, AppError> {
        sqlx::query_as::<_, TicketType>(
            "UPDATE ticket_types SET name=?, price=?, is_enabled=?, sort_order=?, updated_at=? WHERE id=? RETURNING *"
        )
            .bind(&ticket.name).bind(ticket.price).bind(ticket.is_enabled)
            .bind(ticket.sort_order).bind(ticket.updated_at).bind(&ticket.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Ticket type not found".into()))
    }
}
