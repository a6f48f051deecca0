//! Interface de terminal do orderdash: spinner da partida e saída colorida.
//!
//! Usa `indicatif` para o spinner e `console` para as cores. O
//! [`SessionProgress`] se inscreve como observador da sessão e mantém na
//! tela o tempo decorrido e o total ganho.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::orders::Order;
use crate::session::{GameSession, SessionEvent};

/// Formata segundos de jogo como `mm:ss`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Linha de status exibida ao lado do spinner.
pub fn status_line(elapsed: u64, time_limit: u64, earned: f64) -> String {
    format!(
        "{} / {}  ${earned:.2}",
        format_clock(elapsed),
        format_clock(time_limit)
    )
}

/// Spinner que acompanha uma partida em andamento.
pub struct SessionProgress {
    pb: ProgressBar,
    time_limit: u64,
    green: Style,
    yellow: Style,
    cyan: Style,
}

impl SessionProgress {
    /// Inicia o spinner para a partida de `user_id`.
    pub fn start(user_id: &str, time_limit: u64) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {prefix:.bold} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_prefix(user_id.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self::with_bar(pb, time_limit)
    }

    /// Versão sem saída no terminal.
    pub fn hidden(time_limit: u64) -> Self {
        Self::with_bar(ProgressBar::hidden(), time_limit)
    }

    fn with_bar(pb: ProgressBar, time_limit: u64) -> Self {
        pb.set_message(status_line(0, time_limit, 0.0));
        Self {
            pb,
            time_limit,
            green: Style::new().green().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan(),
        }
    }

    pub fn message(&self) -> String {
        self.pb.message()
    }

    /// Observador para [`GameSession::subscribe`].
    ///
    /// Atualiza a linha de status a cada mudança de tempo ou de ganhos e
    /// imprime acima do spinner as trocas de empresa e as pausas.
    pub fn observer(&self) -> impl FnMut(&SessionEvent) + 'static {
        let pb = self.pb.clone();
        let time_limit = self.time_limit;
        let yellow = self.yellow.clone();
        let cyan = self.cyan.clone();
        let mut elapsed = 0;
        let mut earned = 0.0;
        let mut on_break: Option<u32> = None;

        move |event| {
            match event {
                SessionEvent::ElapsedChanged(secs) => elapsed = *secs,
                SessionEvent::EarningsChanged(total) | SessionEvent::GameOver(total) => {
                    earned = *total
                }
                SessionEvent::BreakTick(left) => on_break = Some(*left),
                SessionEvent::BreakEnded => on_break = None,
                SessionEvent::CompanySwitched { .. } => {
                    pb.println(format!("  {} {event}", cyan.apply_to("→")));
                }
                SessionEvent::Paused | SessionEvent::Resumed => {
                    pb.println(format!("  {} {event}", yellow.apply_to("⏸")));
                }
                SessionEvent::OrdersQueued(_) => {}
            }
            let mut line = status_line(elapsed, time_limit, earned);
            if let Some(left) = on_break {
                line.push_str(&format!("  (próximo pedido em {left}s)"));
            }
            pb.set_message(line);
        }
    }

    /// Encerra o spinner e imprime o resumo da partida.
    pub fn finish(&self, session: &GameSession) {
        self.pb.finish_and_clear();
        println!(
            "  {} Partida encerrada em {}",
            self.green.apply_to("✓"),
            format_clock(session.elapsed())
        );
        print_summary(session);
    }
}

/// Imprime o resumo final: ganhos, pedidos concluídos e conjuntos únicos.
pub fn print_summary(session: &GameSession) {
    let label = Style::new().bold();
    let earnings = session.earnings();
    println!("{}", label.apply_to("─── Resumo ───"));
    println!("  ganhos totais:     ${:.2}", session.earned());
    println!("  por pedido:        ${:.2}", earnings.per_job_total());
    println!(
        "  por hora:          ${:.2}",
        earnings.hourly_earnings(session.elapsed())
    );
    println!("  pedidos concluídos: {}", session.finished_orders().len());
    println!("  pedidos perdidos:   {}", session.failed_orders().len());
    println!("  conjuntos únicos:   {}", session.unique_sets());
}

/// Lista os arquivos de condição disponíveis.
pub fn print_configs(names: &[String]) {
    if names.is_empty() {
        println!("  {}", Style::new().yellow().apply_to("nenhum arquivo encontrado"));
        return;
    }
    for name in names {
        println!("  {name}");
    }
}

/// Uma linha por pedido: id, empresa e valor.
pub fn format_order(order: &Order) -> String {
    format!(
        "{:<10} {:<12} ${:.2}",
        order.id,
        order.company_id.as_deref().unwrap_or("-"),
        order.payout_amount()
    )
}

pub fn print_orders(orders: &[Order]) {
    let dim = Style::new().dim();
    if orders.is_empty() {
        println!("  {}", dim.apply_to("nenhum pedido"));
        return;
    }
    for order in orders {
        println!("  {}", format_order(order));
    }
}
