// src/services/document_service.rs

use std::path::PathBuf;

use genpdf::{elements, style, Alignment, Element};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenantRepository,
    middleware::tenancy::TenantScope,
    models::tenancy::{Client, ClientBilling, PaymentStatus},
};

fn payment_label(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "Pendente",
        PaymentStatus::Paid => "Pago",
        PaymentStatus::Failed => "Falhou",
        PaymentStatus::Refunded => "Estornado",
    }
}

#[derive(Clone)]
pub struct DocumentService {
    tenant_repo: TenantRepository,
    fonts_dir: PathBuf,
}

impl DocumentService {
    pub fn new(tenant_repo: TenantRepository, fonts_dir: PathBuf) -> Self {
        Self { tenant_repo, fonts_dir }
    }

    /// Gera a fatura em PDF de uma cobrança do cliente.
    pub async fn invoice_pdf(
        &self,
        client_id: Uuid,
        billing_id: Uuid,
        scope: TenantScope,
    ) -> Result<Vec<u8>, AppError> {
        let client = self
            .tenant_repo
            .find_client(self.tenant_repo.pool(), client_id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("client"))?;
        let billing = self
            .tenant_repo
            .find_billing(client.id, billing_id)
            .await?
            .ok_or(AppError::NotFound("billing"))?;
        let plan_name = match client.subscription_plan_id {
            Some(plan_id) => self
                .tenant_repo
                .find_plan(self.tenant_repo.pool(), plan_id)
                .await?
                .map(|plan| plan.name),
            None => None,
        };

        let fonts_dir = self.fonts_dir.clone();
        // genpdf é síncrono; renderiza fora do runtime
        tokio::task::spawn_blocking(move || render_invoice(&fonts_dir, &client, &billing, plan_name.as_deref()))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de renderização: {}", e))?
    }
}

fn render_invoice(
    fonts_dir: &std::path::Path,
    client: &Client,
    billing: &ClientBilling,
    plan_name: Option<&str>,
) -> Result<Vec<u8>, AppError> {
    let font_family = genpdf::fonts::from_files(fonts_dir, "Roboto", None).map_err(|_| {
        AppError::DocumentError(format!("Fonte Roboto não encontrada em {}", fonts_dir.display()))
    })?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("Fatura {}", billing.invoice_number));
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    // --- CABEÇALHO ---
    doc.push(elements::Paragraph::new("FATURA").styled(style::Style::new().bold().with_font_size(18)));
    doc.push(
        elements::Paragraph::new(format!("Nº {}", billing.invoice_number))
            .styled(style::Style::new().with_font_size(10)),
    );
    doc.push(elements::Break::new(1.5));

    // --- CLIENTE ---
    doc.push(elements::Paragraph::new(client.name.clone()).styled(style::Style::new().bold().with_font_size(14)));
    if !client.billing_address.is_empty() {
        doc.push(elements::Paragraph::new(client.billing_address.clone()));
    }
    doc.push(elements::Paragraph::new(format!("E-mail: {}", client.billing_email)));
    if !client.billing_phone.is_empty() {
        doc.push(elements::Paragraph::new(format!("Telefone: {}", client.billing_phone)));
    }
    doc.push(elements::Break::new(2));

    // --- DETALHES ---
    // Pesos das colunas: Descrição (4), Valor (2)
    let mut table = elements::TableLayout::new(vec![4, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let style_bold = style::Style::new().bold();
    let period = format!(
        "{} a {}",
        billing.billing_period_start.format("%d/%m/%Y"),
        billing.billing_period_end.format("%d/%m/%Y")
    );
    let rows = [
        ("Plano", plan_name.unwrap_or("-").to_string()),
        ("Período", period),
        ("Emissão", billing.created_at.format("%d/%m/%Y").to_string()),
        ("Situação", payment_label(billing.payment_status).to_string()),
    ];

    table
        .row()
        .element(elements::Paragraph::new("Descrição").styled(style_bold))
        .element(elements::Paragraph::new("").styled(style_bold))
        .push()
        .map_err(|e| AppError::DocumentError(e.to_string()))?;
    for (label, value) in rows {
        table
            .row()
            .element(elements::Paragraph::new(label))
            .element(elements::Paragraph::new(value))
            .push()
            .map_err(|e| AppError::DocumentError(e.to_string()))?;
    }
    doc.push(table);
    doc.push(elements::Break::new(2));

    // --- TOTAL ---
    let mut total = elements::Paragraph::new(format!("TOTAL: {:.2}", billing.amount));
    total.set_alignment(Alignment::Right);
    doc.push(total.styled(style::Style::new().bold().with_font_size(12)));

    let mut buffer = Vec::new();
    doc.render(&mut buffer)
        .map_err(|e| AppError::DocumentError(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::models::tenancy::ClientStatus;

    #[test]
    fn missing_fonts_is_a_document_error() {
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            name: "Water Utility".into(),
            industry: "Saneamento".into(),
            status: ClientStatus::Active,
            subscription_plan_id: None,
            subscription_start: None,
            subscription_end: None,
            billing_email: "billing@waterutility.com".into(),
            billing_address: String::new(),
            billing_phone: String::new(),
            created_at: now,
            updated_at: now,
        };
        let billing = ClientBilling {
            id: Uuid::new_v4(),
            client_id: client.id,
            amount: Decimal::new(14970, 2),
            payment_status: PaymentStatus::Pending,
            payment_date: None,
            invoice_number: "INV-x-20260101".into(),
            billing_period_start: now,
            billing_period_end: now,
            created_at: now,
            updated_at: now,
        };

        let err = render_invoice(std::path::Path::new("/nonexistent/fonts"), &client, &billing, None).unwrap_err();
        assert!(matches!(err, AppError::DocumentError(_)));
    }
}
