//! Registros trocados com o armazenamento remoto.
//!
//! Todas as structs derivam `Serialize` e `Deserialize` e usam nomes de campo
//! em camelCase, que é o formato que o backend já guarda para as sessões do jogo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Registro de um novo participante, criado depois que a condição é sorteada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Identificador escolhido pelo participante.
    pub id: String,
    /// Índice da condição experimental atribuída.
    pub condition: usize,
    /// Empresa escolhida no cadastro, se houver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
}

/// Corpo enviado para `POST /auth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub id: String,
    pub password: String,
}

/// Resposta de `POST /auth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub authenticated: bool,
}

/// Valor atual do contador atômico usado para sortear condições.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CounterValue {
    pub value: u64,
}

/// Uma entrada do log de ações do jogador.
///
/// Cada entrada carrega um retrato dos ganhos no momento em que a ação
/// aconteceu. Campos extras da ação são achatados no mesmo objeto JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    /// Botão (ou tipo de evento) que originou a ação.
    #[serde(rename = "buttonID")]
    pub button_id: String,
    /// Tipo do evento de sistema, quando a ação não veio de um botão.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    /// Momento (relógio de parede) em que a ação foi registrada.
    pub timestamp: DateTime<Utc>,
    /// Total ganho até aqui, em dólares arredondados para centavos.
    pub earnings: f64,
    /// Quantidade de pedidos concluídos.
    pub orders_complete: usize,
    /// Segundos de jogo decorridos.
    pub gametime: u64,
    /// Conjuntos únicos concluídos.
    pub unique_sets_complete: u32,
    /// Campos livres específicos da ação.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Atualização parcial do registro de um pedido ao concluí-lo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub status: u8,
    pub endgametime: u64,
}

/// Campos de resumo gravados no registro do usuário.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFields {
    pub earnings: f64,
    pub orders_complete: usize,
    pub unique_sets_complete: u32,
    pub gametime: u64,
}
