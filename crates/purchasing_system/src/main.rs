use std::io::{self, BufRead, Write};
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Utc;
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use base::entities::order::{
    Order, OrderId, OrderProperties, Quantity, VatPercent, MAX_VAT_PERCENT,
};
use base::entities::TOTAL_DECIMAL_PLACES;
use base::stores::OrderTreeStore;

mod input;

const LOG_FILE_ENV: &str = "PO_LOG_FILE";
const LOG_LEVEL_ENV: &str = "PO_LOG_LEVEL";

const DEFAULT_LOG_FILE: &str = "logs/purchasing_system.log";
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logging()?;

    let mut store = OrderTreeStore::new();

    let stdin = io::stdin();
    let stdout = io::stdout();
    run(&mut stdin.lock(), &mut stdout.lock(), &mut store)
}

fn init_logging() -> Result<()> {
    let log_file = dotenv::var(LOG_FILE_ENV).unwrap_or_else(|_| String::from(DEFAULT_LOG_FILE));
    let log_level = match dotenv::var(LOG_LEVEL_ENV) {
        Ok(level) => LevelFilter::from_str(&level)
            .with_context(|| format!("invalid {}: {}", LOG_LEVEL_ENV, level))?,
        Err(_) => DEFAULT_LOG_LEVEL,
    };

    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {l} {t} - {m}{n}",
        )))
        .build(&log_file)
        .with_context(|| format!("can't create a log file at {}", log_file))?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file)))
        .build(Root::builder().appender("file").build(log_level))?;

    log4rs::init_config(config)?;

    Ok(())
}

fn run(
    reader: &mut impl BufRead,
    writer: &mut impl Write,
    store: &mut OrderTreeStore,
) -> Result<()> {
    writeln!(writer, "---------------------------------")?;
    writeln!(writer, "      Purchase Order System")?;
    writeln!(writer, "---------------------------------")?;

    loop {
        write_menu(writer)?;

        let selection = match input::read_line(reader)? {
            Some(line) => line,
            None => break,
        };

        match selection.trim() {
            "1" => {
                if add_order(reader, writer, store)?.is_none() {
                    break;
                }
            }
            "2" => {
                if update_order(reader, writer, store)?.is_none() {
                    break;
                }
            }
            "3" => {
                if delete_order(reader, writer, store)?.is_none() {
                    break;
                }
            }
            "4" => display_orders_by_id(writer, store)?,
            "5" => display_orders_by_total(writer, store, true)?,
            "6" => display_orders_by_total(writer, store, false)?,
            "7" => break,
            other => writeln!(
                writer,
                "Invalid option: {}. Select an option between 1 and 7.",
                other
            )?,
        }
    }

    writeln!(writer, "Exiting the purchase order system.")?;
    Ok(())
}

fn write_menu(writer: &mut impl Write) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "1. Add Order")?;
    writeln!(writer, "2. Update Order")?;
    writeln!(writer, "3. Delete Order")?;
    writeln!(writer, "4. Display Orders (by order ID)")?;
    writeln!(writer, "5. Display Orders (by total, ascending)")?;
    writeln!(writer, "6. Display Orders (by total, descending)")?;
    writeln!(writer, "7. Exit")?;
    write!(writer, "Select an option: ")?;
    writer.flush()?;

    Ok(())
}

fn add_order(
    reader: &mut impl BufRead,
    writer: &mut impl Write,
    store: &mut OrderTreeStore,
) -> Result<Option<()>> {
    writeln!(writer)?;

    let order_id = match input::prompt(reader, writer, "Order ID", |raw| {
        let id = raw
            .parse::<OrderId>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or("An order ID must be a positive integer.")?;

        if store.exists(id) {
            return Err("An order with this ID already exists.");
        }

        Ok(id)
    })? {
        Some(id) => id,
        None => return Ok(None),
    };

    let props = match prompt_order_properties(reader, writer)? {
        Some(props) => props,
        None => return Ok(None),
    };

    let order = match Order::new(order_id, props, Utc::now().naive_utc()) {
        Ok(order) => order,
        Err(error) => {
            writeln!(writer, "The order {} can't be added: {}.", order_id, error)?;
            return Ok(Some(()));
        }
    };
    store.insert(order)?;

    log::info!("added an order with an id {}", order_id);
    writeln!(writer, "The order {} was added successfully.", order_id)?;

    Ok(Some(()))
}

fn update_order(
    reader: &mut impl BufRead,
    writer: &mut impl Write,
    store: &mut OrderTreeStore,
) -> Result<Option<()>> {
    writeln!(writer)?;

    if store.is_empty() {
        writeln!(writer, "There are no orders yet. Add an order first.")?;
        return Ok(Some(()));
    }

    write!(writer, "Order ID: ")?;
    writer.flush()?;
    let raw = match input::read_line(reader)? {
        Some(line) => line,
        None => return Ok(None),
    };

    let order_id = match raw.trim().parse::<OrderId>() {
        Ok(id) if store.exists(id) => id,
        _ => {
            writeln!(writer, "There is no order with this ID.")?;
            return Ok(Some(()));
        }
    };

    let props = match prompt_order_properties(reader, writer)? {
        Some(props) => props,
        None => return Ok(None),
    };

    let order = match Order::new(order_id, props, Utc::now().naive_utc()) {
        Ok(order) => order,
        Err(error) => {
            writeln!(writer, "The order {} can't be updated: {}.", order_id, error)?;
            return Ok(Some(()));
        }
    };
    store.update(order_id, order)?;

    log::info!("updated an order with an id {}", order_id);
    writeln!(writer, "The order {} was updated successfully.", order_id)?;

    Ok(Some(()))
}

fn delete_order(
    reader: &mut impl BufRead,
    writer: &mut impl Write,
    store: &mut OrderTreeStore,
) -> Result<Option<()>> {
    writeln!(writer)?;

    if store.is_empty() {
        writeln!(writer, "There are no orders yet. Add an order first.")?;
        return Ok(Some(()));
    }

    write!(writer, "Order ID: ")?;
    writer.flush()?;
    let raw = match input::read_line(reader)? {
        Some(line) => line,
        None => return Ok(None),
    };

    let order_id = match raw.trim().parse::<OrderId>() {
        Ok(id) if store.exists(id) => id,
        _ => {
            writeln!(writer, "There is no order with this ID.")?;
            return Ok(Some(()));
        }
    };

    let removed = store.delete(order_id)?;

    log::info!(
        "deleted an order with an id {} ({})",
        order_id,
        removed.props().product_name
    );
    writeln!(writer, "The order {} was deleted successfully.", order_id)?;

    Ok(Some(()))
}

fn prompt_order_properties(
    reader: &mut impl BufRead,
    writer: &mut impl Write,
) -> Result<Option<OrderProperties>> {
    let supplier = match input::prompt(reader, writer, "Supplier", |raw| {
        if raw.is_empty() {
            Err("A supplier can't be empty.")
        } else {
            Ok(raw.to_string())
        }
    })? {
        Some(supplier) => supplier,
        None => return Ok(None),
    };

    let address = match input::prompt(reader, writer, "Address", |raw| {
        if raw.is_empty() {
            Err("An address can't be empty.")
        } else {
            Ok(raw.to_string())
        }
    })? {
        Some(address) => address,
        None => return Ok(None),
    };

    let vat = match input::prompt(reader, writer, "VAT percent", |raw| {
        raw.parse::<VatPercent>()
            .ok()
            .filter(|vat| *vat <= MAX_VAT_PERCENT)
            .ok_or("A VAT percent must be an integer between 0 and 100.")
    })? {
        Some(vat) => vat,
        None => return Ok(None),
    };

    let product_name = match input::prompt(reader, writer, "Product name", |raw| {
        if raw.is_empty() {
            Err("A product name can't be empty.")
        } else {
            Ok(raw.to_string())
        }
    })? {
        Some(product_name) => product_name,
        None => return Ok(None),
    };

    let quantity = match input::prompt(reader, writer, "Quantity", |raw| {
        raw.parse::<Quantity>()
            .ok()
            .filter(|quantity| *quantity > 0)
            .ok_or("A quantity must be a positive integer.")
    })? {
        Some(quantity) => quantity,
        None => return Ok(None),
    };

    let unit_price = match input::prompt(reader, writer, "Unit price", |raw| {
        raw.parse::<Decimal>()
            .ok()
            .filter(|price| *price > dec!(0))
            .ok_or("A unit price must be a positive number.")
    })? {
        Some(unit_price) => unit_price,
        None => return Ok(None),
    };

    Ok(Some(OrderProperties {
        supplier,
        address,
        vat,
        product_name,
        quantity,
        unit_price,
    }))
}

fn display_orders_by_id(writer: &mut impl Write, store: &OrderTreeStore) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "--- Orders by order ID ---")?;

    if store.is_empty() {
        writeln!(writer, "No orders to display.")?;
        return Ok(());
    }

    for order in store.orders_by_id() {
        write_order(writer, order)?;
    }

    Ok(())
}

fn display_orders_by_total(
    writer: &mut impl Write,
    store: &OrderTreeStore,
    ascending: bool,
) -> Result<()> {
    let direction = if ascending { "ascending" } else { "descending" };

    writeln!(writer)?;
    writeln!(writer, "--- Orders by total ({}) ---", direction)?;

    let orders = store.sorted_by_total(ascending);
    if orders.is_empty() {
        writeln!(writer, "No orders to display.")?;
        return Ok(());
    }

    for order in &orders {
        write_order(writer, order)?;
    }

    Ok(())
}

fn write_order(writer: &mut impl Write, order: &Order) -> Result<()> {
    let props = order.props();

    writeln!(writer)?;
    writeln!(
        writer,
        "Date & time: {}",
        order.created_at().format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(writer, "Order ID: {}", order.order_id())?;
    writeln!(writer, "Supplier: {}", props.supplier)?;
    writeln!(writer, "Address: {}", props.address)?;
    writeln!(writer, "Product: {}", props.product_name)?;
    writeln!(writer, "Quantity: {}", props.quantity)?;
    writeln!(
        writer,
        "Unit price: {}",
        props.unit_price.round_dp(TOTAL_DECIMAL_PLACES)
    )?;
    writeln!(writer, "VAT: {}%", props.vat)?;
    writeln!(
        writer,
        "Total: {}",
        order.total().round_dp(TOTAL_DECIMAL_PLACES)
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rust_decimal_macros::dec;

    use super::*;

    fn run_session(script: &str) -> (OrderTreeStore, String) {
        let mut store = OrderTreeStore::new();
        let mut output = Vec::new();

        run(&mut Cursor::new(script), &mut output, &mut store).unwrap();

        (store, String::from_utf8(output).unwrap())
    }

    #[test]
    fn should_add_an_order_through_the_menu() {
        let (store, output) =
            run_session("1\n10\nAcme Supplies\n1 Main Street\n10\nWidget\n2\n100\n7\n");

        assert_eq!(store.count(), 1);
        let order = store.get(10).unwrap();
        assert_eq!(order.props().supplier, "Acme Supplies");
        assert_eq!(order.total(), dec!(220));
        assert!(output.contains("The order 10 was added successfully."));
    }

    #[test]
    fn should_reprompt_until_every_field_is_valid() {
        let (store, output) = run_session(
            "1\nabc\n0\n10\nAcme\n1 Main Street\n101\n10\nWidget\n0\n2\n-5\n100\n7\n",
        );

        assert_eq!(store.count(), 1);
        assert_eq!(store.get(10).unwrap().total(), dec!(220));
        assert!(output.contains("An order ID must be a positive integer."));
        assert!(output.contains("A VAT percent must be an integer between 0 and 100."));
        assert!(output.contains("A quantity must be a positive integer."));
        assert!(output.contains("A unit price must be a positive number."));
    }

    #[test]
    fn should_reject_an_order_id_that_is_already_taken() {
        let (store, output) = run_session(
            "1\n10\nAcme\n1 Main Street\n10\nWidget\n2\n100\n1\n10\n11\nAcme\n1 Main Street\n10\nWidget\n1\n100\n7\n",
        );

        assert_eq!(store.count(), 2);
        assert!(store.exists(10));
        assert!(store.exists(11));
        assert!(output.contains("An order with this ID already exists."));
    }

    #[test]
    fn should_update_an_existing_order_with_a_fresh_total() {
        let (store, output) = run_session(
            "1\n10\nAcme\n1 Main Street\n10\nWidget\n2\n100\n2\n10\nNew Acme\n2 Side Street\n20\nGadget\n1\n50\n7\n",
        );

        assert_eq!(store.count(), 1);
        let order = store.get(10).unwrap();
        assert_eq!(order.props().supplier, "New Acme");
        assert_eq!(order.props().product_name, "Gadget");
        assert_eq!(order.total(), dec!(60));
        assert!(output.contains("The order 10 was updated successfully."));
    }

    #[test]
    fn should_delete_an_existing_order() {
        let (store, output) =
            run_session("1\n10\nAcme\n1 Main Street\n10\nWidget\n2\n100\n3\n10\n7\n");

        assert!(store.is_empty());
        assert!(output.contains("The order 10 was deleted successfully."));
    }

    #[test]
    fn should_guard_update_and_delete_on_an_empty_store() {
        let (store, output) = run_session("2\n3\n7\n");

        assert!(store.is_empty());
        assert_eq!(
            output
                .matches("There are no orders yet. Add an order first.")
                .count(),
            2
        );
    }

    #[test]
    fn should_report_a_missing_order_id_and_return_to_the_menu() {
        let (store, output) =
            run_session("1\n10\nAcme\n1 Main Street\n10\nWidget\n2\n100\n3\n99\n7\n");

        assert_eq!(store.count(), 1);
        assert!(output.contains("There is no order with this ID."));
    }

    #[test]
    fn should_display_orders_in_every_view() {
        let (_, output) =
            run_session("1\n10\nAcme\n1 Main Street\n10\nWidget\n2\n100\n4\n5\n6\n7\n");

        assert!(output.contains("--- Orders by order ID ---"));
        assert!(output.contains("--- Orders by total (ascending) ---"));
        assert!(output.contains("--- Orders by total (descending) ---"));
        assert_eq!(output.matches("Order ID: 10").count(), 3);
        assert_eq!(output.matches("Total: 220").count(), 3);
    }

    #[test]
    fn should_print_a_placeholder_when_there_is_nothing_to_display() {
        let (_, output) = run_session("4\n5\n6\n7\n");

        assert_eq!(output.matches("No orders to display.").count(), 3);
    }

    #[test]
    fn should_reject_an_unknown_menu_option() {
        let (store, output) = run_session("9\n7\n");

        assert!(store.is_empty());
        assert!(output.contains("Invalid option: 9. Select an option between 1 and 7."));
    }

    #[test]
    fn should_treat_the_end_of_input_as_exit() {
        let (store, output) = run_session("1\n10\n");

        assert!(store.is_empty());
        assert!(output.contains("Exiting the purchase order system."));
    }

    #[test]
    fn should_report_an_out_of_range_total_and_return_to_the_menu() {
        let (store, output) = run_session(
            "1\n10\nAcme\n1 Main Street\n10\nWidget\n4000000000\n9999999999999999999999\n7\n",
        );

        assert!(store.is_empty());
        assert!(output.contains("The order 10 can't be added:"));
        assert!(output.contains("Exiting the purchase order system."));
    }

    #[test]
    fn should_print_the_menu_with_all_seven_actions() {
        let (_, output) = run_session("7\n");

        let menu = concat!(
            "1. Add Order\n",
            "2. Update Order\n",
            "3. Delete Order\n",
            "4. Display Orders (by order ID)\n",
            "5. Display Orders (by total, ascending)\n",
            "6. Display Orders (by total, descending)\n",
            "7. Exit\n",
            "Select an option: ",
        );
        assert!(output.contains(menu));
    }
}
