//! Console report for a finished walk

use console::style;

use crate::cartographer::PoolSnapshot;
use crate::simulator::price_math::tick_to_sqrt_price_x96;
use crate::simulator::{CompletionReason, LiquidityAnalysis, TickDataQuality};

const RULE: &str = "═══════════════════════════════════════════════════════════════";

pub fn print_banner() {
    println!();
    println!("{}", style(RULE).cyan());
    println!("{}", style(" 🔭 LIQUIDITY SCOUT - Concentrated Liquidity Price Impact").cyan().bold());
    println!("{}", style("    Tick walk | VWAP slippage | Depth to target").cyan());
    println!("{}", style(RULE).cyan());
    println!();
}

/// Gas price in wei, gwei and native units
pub fn format_gas_price(wei: u128, native_symbol: &str) -> String {
    let gwei = wei as f64 / 1e9;
    let native = wei as f64 / 1e18;
    format!("{} wei | {:.4} gwei | {:.12} {}", wei, gwei, native, native_symbol)
}

pub fn print_pool_state(
    snapshot: &PoolSnapshot,
    gas_price: Option<u128>,
    block_number: Option<u64>,
    native_symbol: &str,
) {
    println!("{}", style("═══ POOL STATE ═══").blue().bold());
    println!();
    println!("  Pool:          {:?}", snapshot.pool);
    println!("  Pair:          {}/{}", snapshot.symbol0, snapshot.symbol1);
    println!("  Token0:        {:?} ({} decimals)", snapshot.token0, snapshot.decimals0);
    println!("  Token1:        {:?} ({} decimals)", snapshot.token1, snapshot.decimals1);
    println!("  Tick:          {}", snapshot.tick);
    println!("  Tick Spacing:  {}", snapshot.tick_spacing);
    println!("  Liquidity:     {}", snapshot.liquidity);
    println!(
        "  Spot Price:    {:.6} {} per {}",
        snapshot.spot_price(),
        snapshot.symbol1,
        snapshot.symbol0
    );
    if let (Ok(aligned), Ok(price)) = (snapshot.aligned_tick(), snapshot.aligned_price()) {
        println!(
            "  Walk Start:    tick {} @ {:.6} (sqrtPriceX96 {})",
            aligned,
            price,
            tick_to_sqrt_price_x96(aligned)
        );
    }
    match block_number {
        Some(block) => println!("  Block:         {}", block),
        None => println!("  Block:         {}", style("unknown").yellow()),
    }
    match gas_price {
        Some(wei) => println!("  Gas Price:     {}", format_gas_price(wei, native_symbol)),
        None => println!("  Gas Price:     {}", style("unknown").yellow()),
    }
    println!("  Captured:      {}", snapshot.captured_at.format("%Y-%m-%d %H:%M:%S UTC"));

    if snapshot.is_degraded() {
        let fields: Vec<String> = snapshot.fallbacks.iter().map(|f| f.to_string()).collect();
        println!(
            "  {} Defaults used for: {}",
            style("⚠").yellow(),
            style(fields.join(", ")).yellow()
        );
    }
    println!();
}

pub fn print_steps(analysis: &LiquidityAnalysis, snapshot: &PoolSnapshot) {
    println!("{}", style("═══ TICK WALK ═══").magenta().bold());
    println!();
    println!(
        "  {:>4}  {:>9} → {:<9}  {:>14}  {:>16}  {:>16}  {:>16}  {:>9}",
        "#",
        "lower",
        "upper",
        "price",
        format!("{} in range", snapshot.symbol1),
        format!("{} filled", snapshot.symbol1),
        format!("{} bought", snapshot.symbol0),
        "slippage"
    );

    for (i, step) in analysis.steps.iter().enumerate() {
        let marker = match step.quality {
            TickDataQuality::Fetched => style(" ").dim(),
            TickDataQuality::Unavailable => style("!").yellow(),
        };
        println!(
            "{} {:>4}  {:>9} → {:<9}  {:>14.6}  {:>16.2}  {:>16.2}  {:>16.6}  {:>8.4}%",
            marker,
            i + 1,
            step.tick_lower,
            step.tick,
            step.price,
            step.quote_available,
            step.quote_filled,
            step.base_filled,
            step.slippage * 100.0
        );
    }

    let degraded = analysis.degraded_steps().count();
    if degraded > 0 {
        println!();
        println!(
            "  {} {} tick read(s) failed and were treated as empty",
            style("!").yellow(),
            degraded
        );
    }
    println!();
}

pub fn completion_message(analysis: &LiquidityAnalysis) -> String {
    match analysis.completion {
        CompletionReason::TargetFilled => "Target filled".to_string(),
        CompletionReason::SlippageExceeded => format!(
            "Stopped at {:.3}% slippage (limit {:.3}%)",
            analysis.slippage * 100.0,
            analysis.target.max_slippage * 100.0
        ),
        CompletionReason::SafetyCapReached => format!(
            "Stopped after {} ticks without filling the target",
            analysis.ticks_crossed()
        ),
    }
}

pub fn print_results(analysis: &LiquidityAnalysis, snapshot: &PoolSnapshot) {
    println!("{}", style("═══ RESULTS ═══").green().bold());
    println!();
    println!(
        "  Target:            {:.2} {}",
        analysis.target.target_quote_amount, snapshot.symbol1
    );
    println!(
        "  Filled:            {:.2} {} ({:.2}%)",
        analysis.total_quote_filled,
        snapshot.symbol1,
        analysis.completion_pct()
    );
    println!(
        "  Bought:            {:.6} {}",
        analysis.total_base_bought, snapshot.symbol0
    );
    println!("  Reference Price:   {:.6}", analysis.reference_price);
    println!("  Average Price:     {:.6}", analysis.average_execution_price);
    println!("  Slippage:          {:.4}%", analysis.slippage * 100.0);
    println!(
        "  Ticks:             {} → {} ({} crossed)",
        analysis.start_tick,
        analysis.end_tick,
        analysis.ticks_crossed()
    );
    println!(
        "  Price Range:       {:.6} → {:.6}",
        analysis.start_price, analysis.end_price
    );
    println!("  Liquidity Crossed: {}", analysis.cumulated_liquidity_gross);
    println!();

    let message = completion_message(analysis);
    let status = match analysis.completion {
        CompletionReason::TargetFilled => style(format!("✅ {}", message)).green().bold(),
        CompletionReason::SlippageExceeded => style(format!("⚠️  {}", message)).yellow().bold(),
        CompletionReason::SafetyCapReached => style(format!("🛑 {}", message)).red().bold(),
    };
    println!("{}", style(RULE).green());
    println!(" {}", status);
    println!("{}", style(RULE).green());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::TradeTarget;

    fn analysis(completion: CompletionReason) -> LiquidityAnalysis {
        LiquidityAnalysis {
            target: TradeTarget {
                target_quote_amount: 1000.0,
                max_slippage: 0.002,
                max_ticks_explored: 10,
            },
            completion,
            cumulated_liquidity_gross: 0,
            start_tick: 0,
            end_tick: 60,
            start_price: 1.0,
            end_price: 1.006,
            reference_price: 1.0,
            steps: Vec::new(),
            total_quote_filled: 250.0,
            total_base_bought: 249.0,
            average_execution_price: 1.004,
            slippage: 0.004,
        }
    }

    #[test]
    fn test_format_gas_price() {
        let line = format_gas_price(1_500_000_000, "HYPE");
        assert!(line.starts_with("1500000000 wei | 1.5000 gwei"));
        assert!(line.ends_with("0.000000001500 HYPE"));
    }

    #[test]
    fn test_completion_messages() {
        assert_eq!(
            completion_message(&analysis(CompletionReason::TargetFilled)),
            "Target filled"
        );
        assert_eq!(
            completion_message(&analysis(CompletionReason::SlippageExceeded)),
            "Stopped at 0.400% slippage (limit 0.200%)"
        );
        assert_eq!(
            completion_message(&analysis(CompletionReason::SafetyCapReached)),
            "Stopped after 0 ticks without filling the target"
        );
    }

    #[test]
    fn test_completion_pct() {
        assert_eq!(analysis(CompletionReason::SafetyCapReached).completion_pct(), 25.0);
    }
}
