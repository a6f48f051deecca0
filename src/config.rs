//! Configuração do orderdash.
//!
//! Há duas fontes:
//! - [`AppSettings`], carregada de `orderdash.toml`, com o endereço do
//!   armazenamento remoto e caminhos locais. A variável de ambiente
//!   `ORDERDASH_STORE_TOKEN` tem precedência sobre o arquivo.
//! - [`GameConfig`], o `config.json` do jogo (limite de tempo, empresas,
//!   condições experimentais). Os arquivos de pedidos e de lojas de cada
//!   condição ficam num diretório lido por [`ConfigCatalog`].

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::AppError;
use crate::orders::string_or_number;

/// Variável de ambiente que sobrescreve `store_token`.
pub const STORE_TOKEN_ENV: &str = "ORDERDASH_STORE_TOKEN";

/// Configuração da aplicação carregada de `orderdash.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// URL base do armazenamento remoto. Sem ela a sessão roda offline.
    #[serde(default)]
    pub store_url: Option<String>,

    /// Token enviado como `Authorization: Bearer`.
    #[serde(default)]
    pub store_token: String,

    /// Diretório com os arquivos de pedidos e de lojas por condição.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Caminho do `config.json` do jogo.
    #[serde(default = "default_game_config")]
    pub game_config: PathBuf,

    /// Intervalo do relógio da sessão, em milissegundos.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

// Diretório padrão das condições: "configs".
fn default_config_dir() -> PathBuf {
    PathBuf::from("configs")
}

// Arquivo padrão do jogo: "config.json".
fn default_game_config() -> PathBuf {
    PathBuf::from("config.json")
}

// Tique padrão do relógio: 10ms.
fn default_tick_interval_ms() -> u64 {
    10
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            store_url: None,
            store_token: String::new(),
            config_dir: default_config_dir(),
            game_config: default_game_config(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl AppSettings {
    /// Carrega `orderdash.toml` do diretório atual.
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(Path::new("orderdash.toml"))
    }

    /// Carrega a configuração de `path`, usando valores padrão se o arquivo
    /// não existir.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let mut settings = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<AppSettings>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo para o token.
        if let Ok(token) = std::env::var(STORE_TOKEN_ENV)
            && !token.is_empty()
        {
            settings.store_token = token;
        }

        Ok(settings)
    }
}

/// Forma de pagamento de uma empresa. Valores desconhecidos contam como por pedido.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Hourly,
    #[default]
    #[serde(other)]
    PerJob,
}

/// Uma empresa para a qual o jogador pode trabalhar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub payment_type: PaymentType,
    /// Valor pago por hora online, em dólares.
    #[serde(default, rename = "hourlyRate")]
    pub hourly_rate: f64,
}

impl Company {
    pub fn is_hourly(&self) -> bool {
        self.payment_type == PaymentType::Hourly
    }
}

/// Par de arquivos (pedidos, lojas) que define uma condição experimental.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub order_file: String,
    pub store_file: String,
}

/// Conteúdo do `config.json` do jogo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Duração da partida em segundos de jogo.
    pub time_limit: u64,

    /// Se verdadeiro, o jogador se autentica e as ações são registradas remotamente.
    #[serde(default)]
    pub auth: bool,

    #[serde(default = "default_grid_size")]
    pub grid_size: u32,

    #[serde(default)]
    pub companies: Vec<Company>,

    /// Duração da pausa entre pedidos, em segundos.
    #[serde(default = "default_break_duration")]
    pub break_duration: u32,

    #[serde(default)]
    pub think_time: Option<f64>,

    #[serde(default)]
    pub tips: bool,

    #[serde(default)]
    pub waiting: bool,

    #[serde(default)]
    pub refresh: bool,

    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// Grade padrão: 4 colunas.
fn default_grid_size() -> u32 {
    4
}

// Pausa padrão entre pedidos: 5 segundos.
fn default_break_duration() -> u32 {
    5
}

impl GameConfig {
    /// Lê e valida o `config.json` em `path`.
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn company(&self, id: &str) -> Option<&Company> {
        self.companies.iter().find(|c| c.id == id)
    }
}

/// Catálogo dos arquivos JSON de condição disponíveis num diretório.
#[derive(Debug, Clone)]
pub struct ConfigCatalog {
    dir: PathBuf,
}

impl ConfigCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Nomes dos arquivos `.json` do diretório, em ordem alfabética.
    /// Um diretório inexistente resulta numa lista vazia.
    pub fn options(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            debug!(dir = %self.dir.display(), "config directory not readable");
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    /// Carrega o primeiro arquivo cujo nome termina com `file_name`.
    ///
    /// Arquivo ausente ou JSON inválido são registrados no log e resultam em
    /// `None`; nunca interrompem a sessão.
    pub fn load_by_name<T: DeserializeOwned>(&self, file_name: &str) -> Option<T> {
        let Some(name) = self.options().into_iter().find(|n| n.ends_with(file_name)) else {
            error!(file = file_name, dir = %self.dir.display(), "config file not found");
            return None;
        };
        let path = self.dir.join(&name);
        let parsed = std::fs::read_to_string(&path)
            .map_err(AppError::from)
            .and_then(|contents| serde_json::from_str::<T>(&contents).map_err(AppError::from));
        match parsed {
            Ok(value) => Some(value),
            Err(err) => {
                error!(file = %path.display(), error = %err, "failed to load config file");
                None
            }
        }
    }
}
