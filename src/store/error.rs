//! Tipos de erro para o cliente do armazenamento remoto.
//!
//! Define [`StoreError`] com variantes para erros HTTP retornados pelo
//! backend, falhas de rede e respostas que não puderam ser decodificadas.
//! Usa `thiserror` para derivar `Display` e `Error` a partir dos atributos
//! `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao conversar com o armazenamento remoto.
///
/// - [`Api`](StoreError::Api): o backend respondeu com status não-2xx
/// - [`Unauthorized`](StoreError::Unauthorized): credenciais rejeitadas (401/403)
/// - [`Network`](StoreError::Network): falha na camada de rede
/// - [`Decode`](StoreError::Decode): corpo da resposta em formato inesperado
/// - [`InvalidUrl`](StoreError::InvalidUrl): URL base inutilizável
#[derive(Debug, Error)]
pub enum StoreError {
    /// Erro retornado pelo backend (ex.: 404 usuário inexistente, 500 erro interno).
    #[error("store error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// O backend recusou o token enviado.
    #[error("store rejected credentials (status {status})")]
    Unauthorized { status: u16 },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A resposta chegou mas não tinha o formato esperado.
    #[error("failed to decode store response: {0}")]
    Decode(String),

    /// A URL base configurada não serve como base para as rotas.
    #[error("invalid store URL: {0}")]
    InvalidUrl(String),
}

impl StoreError {
    /// Indica se o erro veio do backend (e não da rede ou da decodificação).
    pub fn is_api(&self) -> bool {
        matches!(self, StoreError::Api { .. } | StoreError::Unauthorized { .. })
    }
}
