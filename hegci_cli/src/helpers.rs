use hegci::config::Config;
use hegci::heg::SolveResult;
use prettytable::format::{FormatBuilder, LinePosition, LineSeparator};
use prettytable::{row, Table};

pub fn create_table() -> Table {
    let mut table = Table::new();
    table.set_format(
        FormatBuilder::new()
            .column_separator(' ')
            .separator(LinePosition::Title, LineSeparator::new('-', '+', ' ', ' '))
            .build(),
    );
    table
}

pub fn print_config_table(config: &Config) {
    let mut table = create_table();
    table.set_titles(row![c => "key", "value"]);

    table.add_row(row!["type", r->config.system]);
    table.add_row(row!["n_up", r->config.n_up]);
    table.add_row(row!["n_dn", r->config.n_dn]);
    table.add_row(row!["r_s", r->config.r_s]);
    table.add_row(row!["rcut_vars", r->format!("{:?}", config.rcut_vars)]);
    table.add_row(row!["eps_vars", r->format!("{:?}", config.eps_vars)]);
    table.add_row(row![
        "eps_var_ham_old_ratio",
        r->config.eps_var_ham_old_ratio
    ]);
    table.add_row(row![
        "eps_var_ham_new_ratio",
        r->config.eps_var_ham_new_ratio
    ]);

    table.printstd();
}

pub fn print_energy_table(result: &SolveResult) {
    let mut table = create_table();
    table.set_titles(row![c => "rcut_var", "eps_var", "energy_var [Ha]", "dets"]);

    for record in &result.energies {
        table.add_row(row![
            r->record.rcut_var,
            r->record.eps_var,
            r->format!("{:.10}", record.energy_var),
            r->record.n_dets
        ]);
    }

    table.printstd();
}
