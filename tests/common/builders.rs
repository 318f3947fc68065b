//! Field builders for creating floor work in tests

use chrono::NaiveDate;

use floor_core::models::{NewBobbinLot, NewProductionOrder, NewWorkOrder};

pub fn work_order_fields(client: &str, quantity: u64) -> NewWorkOrder {
    NewWorkOrder {
        client: client.to_string(),
        article: "Fio penteado 30/1".to_string(),
        yarn_color: "cru".to_string(),
        quantity,
        notes: String::new(),
    }
}

pub fn due_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
}

pub fn production_order_fields(client: &str) -> NewProductionOrder {
    NewProductionOrder {
        client: client.to_string(),
        article: "Malha PV".to_string(),
        yarn_color: "azul marinho".to_string(),
        meters: 1_200,
        due_date: due_date(),
        notes: "entrega parcial".to_string(),
    }
}

/// Builder for bobbin lot fields
pub struct BobbinLotBuilder {
    lot_code: String,
    client: String,
    meters: u64,
    due_date: NaiveDate,
}

impl BobbinLotBuilder {
    pub fn new(lot_code: &str) -> Self {
        Self {
            lot_code: lot_code.to_string(),
            client: "Tecelagem Norte".to_string(),
            meters: 800,
            due_date: due_date(),
        }
    }

    pub fn with_client(mut self, client: &str) -> Self {
        self.client = client.to_string();
        self
    }

    pub fn due_on(mut self, due_date: NaiveDate) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn build(self) -> NewBobbinLot {
        NewBobbinLot {
            client: self.client,
            article: "Fio 24/1".to_string(),
            yarn_color: "vermelho".to_string(),
            meters: self.meters,
            lot_code: self.lot_code,
            due_date: self.due_date,
            notes: String::new(),
        }
    }
}
