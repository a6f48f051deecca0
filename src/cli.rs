//! Interface de linha de comando do orderdash baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (play, configs, queue)
//! e flags globais (--verbose, --offline, --config-dir).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// orderdash: sessão de jogo de entregas com registro remoto de ações.
#[derive(Debug, Parser)]
#[command(name = "orderdash", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Não contata o armazenamento remoto, mesmo com `store_url` configurada.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Diretório com os arquivos de pedidos e lojas (sobrescreve `config_dir`).
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Joga uma partida no terminal até o limite de tempo.
    Play {
        /// Identificador do jogador. Gerado (UUID v4) se omitido.
        #[arg(long)]
        user: Option<String>,

        /// Empresa escolhida ao iniciar.
        #[arg(long)]
        company: Option<String>,

        /// Senha do jogador, quando a autenticação está ativa.
        #[arg(long)]
        password: Option<String>,

        /// Conclui pedidos automaticamente, respeitando o `thinkTime`.
        #[arg(long, default_value_t = false)]
        autoplay: bool,
    },

    /// Lista os arquivos de condição disponíveis.
    Configs,

    /// Mostra os próximos pedidos de uma empresa na condição 0.
    Queue {
        /// Empresa; sem ela, a lista completa é percorrida.
        #[arg(long)]
        company: Option<String>,

        /// Quantidade de pedidos.
        #[arg(short, default_value_t = 4)]
        n: usize,
    },
}
