use super::ui;
use crate::core::vocabulary::{CURRENCIES, CurrencyClass};
use anyhow::Result;
use comfy_table::Cell;

pub fn run() -> Result<()> {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Code"),
        ui::header_cell("Type"),
    ]);

    for entry in CURRENCIES {
        let class = match entry.class {
            CurrencyClass::Fiat => "Fiat",
            CurrencyClass::Crypto => "Crypto",
        };
        table.add_row(vec![
            Cell::new(entry.name),
            Cell::new(entry.code),
            Cell::new(class),
        ]);
    }

    println!("{table}");
    Ok(())
}
